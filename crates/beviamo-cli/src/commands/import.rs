use std::path::Path;

use beviamo_core::export::import_history;
use beviamo_core::SyncReport;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_import(import_path: &Path, data_path: &Path) -> Result<SyncReport, CliError> {
    let payload = std::fs::read_to_string(import_path)?;
    let store = open_store(data_path)?;

    let report = import_history(&store, &payload);
    if !report.success {
        return Err(CliError::ImportFailed(report.error.unwrap_or_default()));
    }

    println!("Imported {} new interventions", report.added);
    Ok(report)
}
