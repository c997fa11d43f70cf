use std::path::Path;

use beviamo_core::models::{checklist_item, find_station, Intervention, InterventionType, Photo};
use beviamo_core::store::LocalStore;

use crate::cli::InterventionKind;
use crate::commands::common::{open_store, photo_data_url, render_draft};
use crate::error::CliError;

/// Discard the current draft and start a fresh one
pub fn run_new(data_path: &Path) -> Result<(), CliError> {
    let store = open_store(data_path)?;
    store.clear_draft()?;
    let draft = store.load_draft();
    store.save_draft(&draft)?;

    println!("{}", draft.id);
    Ok(())
}

pub fn run_show(as_json: bool, data_path: &Path) -> Result<(), CliError> {
    let draft = open_store(data_path)?.load_draft();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&draft)?);
    } else {
        for line in render_draft(&draft) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Field changes requested by `beviamo set`
#[derive(Debug, Default)]
pub struct DraftChanges {
    pub station: Option<String>,
    pub kind: Option<InterventionKind>,
    pub note: Option<String>,
    pub altro: Option<String>,
}

impl DraftChanges {
    const fn is_empty(&self) -> bool {
        self.station.is_none() && self.kind.is_none() && self.note.is_none() && self.altro.is_none()
    }
}

pub fn run_set(changes: DraftChanges, data_path: &Path) -> Result<(), CliError> {
    if changes.is_empty() {
        return Err(CliError::NothingToSet);
    }

    let store = open_store(data_path)?;
    let mut draft = store.load_draft();
    apply_changes(&mut draft, changes)?;
    store.save_draft(&draft)?;

    for line in render_draft(&draft) {
        println!("{line}");
    }
    Ok(())
}

pub fn apply_changes(draft: &mut Intervention, changes: DraftChanges) -> Result<(), CliError> {
    if let Some(station_id) = changes.station {
        let station = find_station(station_id.trim())
            .ok_or_else(|| CliError::StationNotFound(station_id.clone()))?;
        draft.select_station(station);
    }

    if let Some(kind) = changes.kind {
        draft.set_type(kind.into());
    }

    if let Some(altro) = changes.altro {
        if draft.tipo_intervento != InterventionType::Altro {
            return Err(beviamo_core::Error::InvalidInput(
                "--altro only applies to interventions of type altro".to_string(),
            )
            .into());
        }
        draft.set_altro_specifica(Some(altro));
    }

    if let Some(note) = changes.note {
        draft.set_note(note.trim());
    }
    Ok(())
}

pub fn run_check(item_id: &str, data_path: &Path) -> Result<(), CliError> {
    let store = open_store(data_path)?;
    let mut draft = store.load_draft();
    let checked = draft.toggle_check(item_id.trim())?;
    store.save_draft(&draft)?;

    let mark = if checked { "x" } else { " " };
    let label = checklist_item(item_id.trim()).map_or("", |item| item.label);
    println!("[{mark}] {} {label}", item_id.trim());
    Ok(())
}

pub fn run_check_note(item_id: &str, text_parts: &[String], data_path: &Path) -> Result<(), CliError> {
    let store = open_store(data_path)?;
    let mut draft = store.load_draft();
    draft.set_check_note(item_id.trim(), &text_parts.join(" "))?;
    store.save_draft(&draft)?;

    println!("{}", item_id.trim());
    Ok(())
}

pub fn run_photo_add(photo_path: &Path, data_path: &Path) -> Result<(), CliError> {
    let data_url = photo_data_url(photo_path)?;

    let store = open_store(data_path)?;
    let mut draft = store.load_draft();
    let photo = Photo::new(data_url);
    let photo_id = photo.id.clone();
    draft.add_photo(photo);
    store.save_draft(&draft)?;

    println!("{photo_id}");
    Ok(())
}

pub fn run_photo_remove(photo_id: &str, data_path: &Path) -> Result<(), CliError> {
    let store = open_store(data_path)?;
    let mut draft = store.load_draft();
    if !draft.remove_photo(photo_id.trim()) {
        return Err(CliError::PhotoNotFound(photo_id.to_string()));
    }
    store.save_draft(&draft)?;

    println!("Removed photo {}", photo_id.trim());
    Ok(())
}
