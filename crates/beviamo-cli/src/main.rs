//! Beviamo CLI - field reports for Punto Acqua water stations
//!
//! Fill in a draft intervention, submit it to local history and share it
//! with the team through a workspace bucket.

mod cli;
mod cli_config;
mod commands;
mod error;


use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, PhotoCommands};
use crate::cli_config::CliConfig;
use crate::commands::common::resolve_data_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::draft::{
    run_check, run_check_note, run_new, run_photo_add, run_photo_remove, run_set, run_show,
    DraftChanges,
};
use crate::commands::export::run_export;
use crate::commands::history::run_history;
use crate::commands::import::run_import;
use crate::commands::station::run_station;
use crate::commands::submit::run_submit;
use crate::commands::sync::run_sync;
use crate::commands::workspace::run_workspace;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beviamo=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help().map_err(CliError::Io)?;
        println!();
        return Ok(());
    };

    let data_path = || resolve_data_path(cli.data_path.clone());

    match command {
        Commands::New => run_new(&data_path()?)?,
        Commands::Show { json } => run_show(json, &data_path()?)?,
        Commands::Station { query } => run_station(&query)?,
        Commands::Set {
            station,
            kind,
            note,
            altro,
        } => run_set(
            DraftChanges {
                station,
                kind,
                note,
                altro,
            },
            &data_path()?,
        )?,
        Commands::Check { item } => run_check(&item, &data_path()?)?,
        Commands::CheckNote { item, text } => run_check_note(&item, &text, &data_path()?)?,
        Commands::Photo { command } => match command {
            PhotoCommands::Add { path } => run_photo_add(&path, &data_path()?)?,
            PhotoCommands::Remove { id } => run_photo_remove(&id, &data_path()?)?,
        },
        Commands::Submit => run_submit(&load_config()?, &data_path()?).await?,
        Commands::History {
            station,
            limit,
            json,
        } => run_history(station.as_deref(), limit, json, &data_path()?)?,
        Commands::Sync => {
            run_sync(&load_config()?, &data_path()?).await?;
        }
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), &data_path()?)?;
        }
        Commands::Import { path } => {
            run_import(&path, &data_path()?)?;
        }
        Commands::Workspace { command } => run_workspace(command, &data_path()?)?,
        Commands::Config { command } => run_config(command)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}

fn load_config() -> Result<CliConfig, CliError> {
    CliConfig::load().map_err(CliError::Config)
}
