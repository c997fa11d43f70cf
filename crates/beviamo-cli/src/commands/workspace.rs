use std::path::Path;

use beviamo_core::store::LocalStore;

use crate::cli::WorkspaceCommands;
use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_workspace(command: Option<WorkspaceCommands>, data_path: &Path) -> Result<(), CliError> {
    let store = open_store(data_path)?;

    match command.unwrap_or(WorkspaceCommands::Show) {
        WorkspaceCommands::Show => {
            let key = store.workspace_key();
            if key.is_empty() {
                println!("(not set; working locally only)");
            } else {
                println!("{key}");
            }
        }
        WorkspaceCommands::Set { key } => {
            let stored = store.set_workspace_key(&key)?;
            if stored.is_empty() {
                println!("Workspace key cleared (no usable characters in '{key}')");
            } else {
                if stored.as_str() != key.trim() {
                    eprintln!("Dropped unsupported characters from workspace key");
                }
                println!("{stored}");
            }
        }
        WorkspaceCommands::Clear => {
            store.set_workspace_key("")?;
            println!("Workspace key cleared");
        }
    }

    Ok(())
}
