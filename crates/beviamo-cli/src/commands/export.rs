use std::path::{Path, PathBuf};

use beviamo_core::export::{render_history_export, suggested_export_file_name};
use beviamo_core::store::LocalStore;
use chrono::Utc;

use crate::cli::ExportFormat;
use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    data_path: &Path,
) -> Result<(), CliError> {
    let now_ms = Utc::now().timestamp_millis();
    let history = open_store(data_path)?.load_history();
    let rendered = render_history_export(history, format.into(), now_ms)?;

    if let Some(path) = output_path {
        let path = resolve_output_path(path, format, now_ms);
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// A directory target gets the default export file name inside it
fn resolve_output_path(path: &Path, format: ExportFormat, now_ms: i64) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(format.into(), now_ms))
    } else {
        path.to_path_buf()
    }
}
