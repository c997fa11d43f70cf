//! History export and additive import shared by every front end.

use std::fmt::Write as _;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::models::{checklist_item, decode_records, deserialize_records, Intervention};
use crate::store::LocalStore;
use crate::sync::merge::{merge_records, missing_from};
use crate::sync::SyncReport;

/// Export output format shared by all clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Portable backup: `{ history, exportDate }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(deserialize_with = "deserialize_records")]
    pub history: Vec<Intervention>,
    pub export_date: i64,
}

#[must_use]
pub fn export_history(history: Vec<Intervention>, now_ms: i64) -> ExportDocument {
    ExportDocument {
        history,
        export_date: now_ms,
    }
}

/// Render an export document as pretty-printed JSON.
pub fn render_json_export(document: &ExportDocument) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}

/// Render history as a Markdown report, one frontmatter block per record.
#[must_use]
pub fn render_markdown_export(history: &[Intervention]) -> String {
    let mut output = String::new();

    for (index, record) in history.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", record.id);
        let _ = writeln!(output, "casetta_id: {}", record.casetta_id);
        let _ = writeln!(output, "tipo_intervento: {}", record.tipo_intervento);
        let _ = writeln!(output, "created_at: {}", format_timestamp(record.created_at));
        let _ = writeln!(output, "updated_at: {}", format_timestamp(record.updated_at));
        let _ = writeln!(output, "sync_status: {}", record.sync_status);
        let _ = writeln!(output, "---");
        let _ = writeln!(output);

        let title = if record.casetta_label.is_empty() {
            "(no station)"
        } else {
            record.casetta_label.as_str()
        };
        let _ = writeln!(output, "## {title}");

        if let Some(altro) = &record.altro_specifica {
            let _ = writeln!(output);
            let _ = writeln!(output, "Detail: {altro}");
        }

        if record.tipo_intervento.uses_checklist() {
            if let Some(checklist) = &record.checklist {
                write_checklist(&mut output, checklist);
            }
        }

        if !record.note.is_empty() {
            let _ = writeln!(output);
            output.push_str(&record.note);
            output.push('\n');
        }

        if !record.fotos.is_empty() {
            let _ = writeln!(output);
            let _ = writeln!(output, "Photos: {}", record.fotos.len());
        }
    }

    output
}

fn write_checklist(output: &mut String, checklist: &crate::models::Checklist) {
    let mut ids = checklist
        .checks
        .keys()
        .chain(checklist.notes.keys())
        .collect::<Vec<_>>();
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return;
    }

    let _ = writeln!(output);
    for id in ids {
        let label = checklist_item(id).map_or(id.as_str(), |item| item.label);
        let mark = if checklist.is_checked(id) { "x" } else { " " };
        match checklist.notes.get(id) {
            Some(note) if !note.is_empty() => {
                let _ = writeln!(output, "- [{mark}] {label}: {note}");
            }
            _ => {
                let _ = writeln!(output, "- [{mark}] {label}");
            }
        }
    }
}

fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date| date.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

/// Render history based on selected export format.
pub fn render_history_export(
    history: Vec<Intervention>,
    format: ExportFormat,
    now_ms: i64,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(&export_history(history, now_ms)),
        ExportFormat::Markdown => Ok(render_markdown_export(&history)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("beviamo-export-{timestamp_ms}.{}", format.extension())
}

/// Add records from an export document whose ids are not yet in local history.
///
/// Import is additive only: existing records are never replaced or removed.
/// A payload that is not JSON, or lacks a `history` array, changes nothing.
pub fn import_history(store: &impl LocalStore, payload: &str) -> SyncReport {
    let imported = match parse_import(payload) {
        Ok(imported) => imported,
        Err(error) => {
            tracing::warn!("Rejected import: {error}");
            return SyncReport::failed(&error);
        }
    };

    let result = store.update_history(|history| {
        let additions = missing_from(&imported, history.as_slice())
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        let added = additions.len();
        if added > 0 {
            let current = std::mem::take(history);
            *history = merge_records(additions.into_iter().chain(current));
        }
        added
    });

    match result {
        Ok(0) => {
            tracing::info!("Import contained no new interventions");
            SyncReport::succeeded(0)
        }
        Ok(added) => {
            tracing::info!(added, "Imported interventions");
            SyncReport::succeeded(added)
        }
        Err(error) => {
            tracing::error!("Failed to persist imported history: {error}");
            SyncReport::failed(&error)
        }
    }
}

fn parse_import(payload: &str) -> Result<Vec<Intervention>, Error> {
    let document = serde_json::from_str::<Value>(payload)?;
    match document.get("history") {
        Some(Value::Array(records)) => Ok(decode_records(records.clone())),
        _ => Err(Error::InvalidInput(
            "import file has no history array".to_string(),
        )),
    }
}
