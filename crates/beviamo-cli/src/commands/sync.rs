use std::path::Path;

use beviamo_core::SyncReport;

use crate::cli_config::CliConfig;
use crate::commands::common::open_engine;
use crate::error::CliError;

pub async fn run_sync(config: &CliConfig, data_path: &Path) -> Result<SyncReport, CliError> {
    let engine = open_engine(data_path, config)?;
    if !engine.settings().is_remote_enabled() {
        return Err(CliError::WorkspaceNotSet);
    }
    if engine.transport().is_none() {
        return Err(CliError::BucketNotConfigured);
    }

    let report = engine.sync_with_cloud().await;
    if !report.success {
        return Err(CliError::SyncFailed(report.error.unwrap_or_default()));
    }

    println!("Sync completed ({} new interventions)", report.added);
    Ok(report)
}
