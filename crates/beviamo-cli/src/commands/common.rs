use std::path::{Path, PathBuf};

use base64::prelude::{Engine as _, BASE64_STANDARD};
use beviamo_core::models::{Intervention, CHECKLIST_SECTIONS};
use beviamo_core::remote::HttpBucketClient;
use beviamo_core::store::SqliteLocalStore;
use beviamo_core::SyncEngine;
use chrono::Utc;
use serde::Serialize;

use crate::cli_config::CliConfig;
use crate::error::CliError;

pub const MAX_PHOTO_BYTES: usize = 8 * 1024 * 1024;

/// Engine as wired by the CLI: `SQLite` store plus an optional HTTP bucket
pub type CliEngine = SyncEngine<SqliteLocalStore, Option<HttpBucketClient>>;

#[derive(Debug, Serialize)]
pub struct HistoryListItem {
    pub id: String,
    pub casetta_id: String,
    pub casetta_label: String,
    pub tipo_intervento: String,
    pub created_at: i64,
    pub created_at_iso: String,
    pub relative_time: String,
    pub sync_status: String,
    pub photos: usize,
    pub checked_items: usize,
    pub note_preview: String,
}

pub fn default_data_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("beviamo").join("beviamo.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn resolve_data_path(cli_data_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    cli_data_path.map_or_else(default_data_path, Ok)
}

pub fn open_store(path: &Path) -> Result<SqliteLocalStore, CliError> {
    Ok(SqliteLocalStore::open(path)?)
}

pub fn open_engine(data_path: &Path, config: &CliConfig) -> Result<CliEngine, CliError> {
    let store = open_store(data_path)?;
    let transport = config
        .bucket_base_url()
        .map(HttpBucketClient::new)
        .transpose()?;
    Ok(SyncEngine::from_store(store, transport, config.technician()))
}

pub fn filter_history(
    history: Vec<Intervention>,
    station: Option<&str>,
    limit: usize,
) -> Vec<Intervention> {
    history
        .into_iter()
        .filter(|record| {
            station.is_none_or(|id| record.casetta_id.eq_ignore_ascii_case(id.trim()))
        })
        .take(limit)
        .collect()
}

pub fn format_history_lines(history: &[Intervention]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    history
        .iter()
        .map(|record| {
            let id = short_id(record.id.as_str());
            let station = if record.casetta_id.is_empty() {
                "-"
            } else {
                record.casetta_id.as_str()
            };
            let kind = record.tipo_intervento.label();
            let relative_time = format_relative_time(record.created_at, now_ms);
            let preview = note_preview(&record.note, 40);

            if preview.is_empty() {
                format!(
                    "{id:<8}  {station:<7}  {kind:<22}  {relative_time:<10}  {}",
                    record.sync_status
                )
            } else {
                format!(
                    "{id:<8}  {station:<7}  {kind:<22}  {relative_time:<10}  {:<7}  {preview}",
                    record.sync_status
                )
            }
        })
        .collect()
}

pub fn history_to_list_item(record: &Intervention) -> HistoryListItem {
    let now_ms = Utc::now().timestamp_millis();
    HistoryListItem {
        id: record.id.to_string(),
        casetta_id: record.casetta_id.clone(),
        casetta_label: record.casetta_label.clone(),
        tipo_intervento: record.tipo_intervento.label().to_string(),
        created_at: record.created_at,
        created_at_iso: format_timestamp(record.created_at),
        relative_time: format_relative_time(record.created_at, now_ms),
        sync_status: record.sync_status.to_string(),
        photos: record.fotos.len(),
        checked_items: record
            .checklist
            .as_ref()
            .map_or(0, beviamo_core::models::Checklist::checked_count),
        note_preview: note_preview(&record.note, 80),
    }
}

/// Human-readable view of a draft
pub fn render_draft(draft: &Intervention) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Draft {}  (started {})",
            short_id(draft.id.as_str()),
            format_timestamp(draft.created_at)
        ),
        format!(
            "Station:  {}",
            if draft.has_station() {
                draft.casetta_label.as_str()
            } else {
                "(none)"
            }
        ),
        format!("Type:     {}", draft.tipo_intervento),
    ];

    if let Some(altro) = &draft.altro_specifica {
        lines.push(format!("Detail:   {altro}"));
    }
    if !draft.note.is_empty() {
        lines.push(format!("Note:     {}", note_preview(&draft.note, 60)));
    }

    lines.push(format!("Photos:   {}", draft.fotos.len()));
    for photo in &draft.fotos {
        lines.push(format!("  {}  {}", photo.id, format_timestamp(photo.timestamp)));
    }

    if draft.tipo_intervento.uses_checklist() {
        let checklist = draft.checklist.clone().unwrap_or_default();
        let total = CHECKLIST_SECTIONS
            .iter()
            .map(|section| section.items.len())
            .sum::<usize>();
        lines.push(format!("Checklist {}/{total}", checklist.checked_count()));
        for section in CHECKLIST_SECTIONS {
            lines.push(format!("  {}", section.title));
            for item in section.items {
                let mark = if checklist.is_checked(item.id) { "x" } else { " " };
                match checklist.notes.get(item.id) {
                    Some(note) => {
                        lines.push(format!("    [{mark}] {:<12} {}: {note}", item.id, item.label));
                    }
                    None => lines.push(format!("    [{mark}] {:<12} {}", item.id, item.label)),
                }
            }
        }
    }

    lines
}

/// Read an image file and encode it as a `data:` URL
pub fn photo_data_url(path: &Path) -> Result<String, CliError> {
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .filter(|mime| mime.starts_with("image/"))
        .ok_or_else(|| CliError::UnsupportedPhoto(format!("{} is not an image", path.display())))?;

    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Err(CliError::UnsupportedPhoto(format!("{} is empty", path.display())));
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(CliError::UnsupportedPhoto(format!(
            "{} is larger than {} MiB",
            path.display(),
            MAX_PHOTO_BYTES / (1024 * 1024)
        )));
    }

    let encoded = BASE64_STANDARD.encode(bytes);
    Ok(format!("data:{mime_type};base64,{encoded}"))
}

pub fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

pub fn note_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}
