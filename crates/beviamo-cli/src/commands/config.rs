use crate::cli::ConfigCommands;
use crate::cli_config::{normalize_bucket_url, CliConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            technician,
            bucket_url,
        } => {
            let mut config = CliConfig::load().map_err(CliError::Config)?;
            apply_config_init(&mut config, technician, bucket_url)?;
            let path = config.save().map_err(CliError::Config)?;
            println!("Saved CLI config to {}", path.display());
            Ok(())
        }
    }
}

/// Merge explicit values into an existing config, keeping fields not given
pub fn apply_config_init(
    config: &mut CliConfig,
    technician: Option<String>,
    bucket_url: Option<String>,
) -> Result<(), CliError> {
    if let Some(technician) = beviamo_core::util::normalize_text_option(technician) {
        config.technician = Some(technician);
    }
    if let Some(url) = bucket_url {
        config.bucket_base_url = Some(normalize_bucket_url(url).map_err(CliError::Config)?);
    }
    Ok(())
}
