//! Intervention model

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::checklist::{is_known_checklist_item, Checklist};
use super::station::Station;
use crate::error::{Error, Result};
use crate::util::unix_millis_now;

/// Identifier of an intervention, the merge key for sync and import.
///
/// New ids are random UUID v4 strings. Ids coming from the bucket or an
/// import file are accepted verbatim as long as they are not empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterventionId(String);

impl InterventionId {
    /// Create a new random identifier
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InterventionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InterventionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InterventionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput(
                "intervention id must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// Intervention categories
///
/// Categories this client does not know (written by a newer revision) are
/// kept verbatim in `Other` so they survive a round trip through the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InterventionType {
    #[default]
    ManutenzioneOrdinaria,
    Guasto,
    Altro,
    Other(String),
}

impl InterventionType {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::ManutenzioneOrdinaria => "Manutenzione Ordinaria",
            Self::Guasto => "Guasto",
            Self::Altro => "Altro",
            Self::Other(label) => label,
        }
    }

    /// Only routine maintenance carries the safety checklist.
    #[must_use]
    pub const fn uses_checklist(&self) -> bool {
        matches!(self, Self::ManutenzioneOrdinaria)
    }
}

impl From<String> for InterventionType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Manutenzione Ordinaria" => Self::ManutenzioneOrdinaria,
            "Guasto" => Self::Guasto,
            "Altro" => Self::Altro,
            _ => Self::Other(label),
        }
    }
}

impl From<InterventionType> for String {
    fn from(kind: InterventionType) -> Self {
        match kind {
            InterventionType::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for InterventionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Informational sync tag. Merge logic never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Draft,
    Queued,
    Synced,
    Error,
    /// Status written by another client that this one does not recognize
    #[serde(other)]
    Unknown,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Queued => "queued",
            Self::Synced => "synced",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.pad(label)
    }
}

/// A photo attached to an intervention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    #[serde(default)]
    pub id: String,
    /// `data:` URL with the base64 encoded image
    #[serde(default)]
    pub data_url: String,
    /// Capture timestamp (Unix ms)
    #[serde(default)]
    pub timestamp: i64,
}

impl Photo {
    #[must_use]
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data_url: data_url.into(),
            timestamp: unix_millis_now(),
        }
    }
}

/// One recorded maintenance event for a water station
///
/// Only `id` and `createdAt` are required. Every other field falls back to
/// its default when missing or malformed, and fields this client does not
/// know are kept in `extra`, so records written by other clients are never
/// dropped or trimmed on the way back to the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    pub id: InterventionId,
    #[serde(default, deserialize_with = "lenient")]
    pub casetta_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub casetta_label: String,
    #[serde(default, deserialize_with = "lenient")]
    pub tipo_intervento: InterventionType,
    /// Free-text detail for `Altro` interventions
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub altro_specifica: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub note: String,
    #[serde(default, deserialize_with = "lenient")]
    pub fotos: Vec<Photo>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub checklist: Option<Checklist>,
    /// Creation timestamp (Unix ms), never changed after construction
    pub created_at: i64,
    /// Last draft mutation timestamp (Unix ms)
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub sync_status: SyncStatus,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub sync_error_message: Option<String>,
    /// Fields from other clients, written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Intervention {
    /// Create a fresh draft with default fields
    #[must_use]
    pub fn new() -> Self {
        let now = unix_millis_now();
        Self {
            id: InterventionId::new(),
            casetta_id: String::new(),
            casetta_label: String::new(),
            tipo_intervento: InterventionType::default(),
            altro_specifica: None,
            note: String::new(),
            fotos: Vec::new(),
            checklist: Some(Checklist::default()),
            created_at: now,
            updated_at: now,
            sync_status: SyncStatus::Draft,
            sync_error_message: None,
            extra: Map::new(),
        }
    }

    /// Whether a station has been chosen for this record
    #[must_use]
    pub fn has_station(&self) -> bool {
        !self.casetta_id.trim().is_empty()
    }

    /// Reject records that cannot be submitted yet
    pub fn ensure_submittable(&self) -> Result<()> {
        if self.has_station() {
            Ok(())
        } else {
            Err(Error::MissingStation)
        }
    }

    /// Repair a missing checklist sub-object. Returns `true` when repaired.
    pub fn repair(&mut self) -> bool {
        if self.checklist.is_some() {
            return false;
        }
        self.checklist = Some(Checklist::default());
        true
    }

    pub fn select_station(&mut self, station: &Station) {
        self.casetta_id = station.id.to_string();
        self.casetta_label = station.label();
        self.touch();
    }

    pub fn set_type(&mut self, kind: InterventionType) {
        if kind != InterventionType::Altro {
            self.altro_specifica = None;
        }
        self.tipo_intervento = kind;
        self.touch();
    }

    pub fn set_altro_specifica(&mut self, text: Option<String>) {
        self.altro_specifica = crate::util::normalize_text_option(text);
        self.touch();
    }

    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
        self.touch();
    }

    /// Append a photo; photos are never reordered
    pub fn add_photo(&mut self, photo: Photo) {
        self.fotos.push(photo);
        self.touch();
    }

    /// Remove a photo by id. Returns `false` when no photo matched.
    pub fn remove_photo(&mut self, photo_id: &str) -> bool {
        let before = self.fotos.len();
        self.fotos.retain(|photo| photo.id != photo_id);
        let removed = self.fotos.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Flip a checklist item and return its new value
    pub fn toggle_check(&mut self, item_id: &str) -> Result<bool> {
        if !is_known_checklist_item(item_id) {
            return Err(Error::UnknownChecklistItem(item_id.to_string()));
        }
        let checklist = self.checklist.get_or_insert_with(Checklist::default);
        let value = checklist.toggle(item_id);
        self.touch();
        Ok(value)
    }

    pub fn set_check_note(&mut self, item_id: &str, note: &str) -> Result<()> {
        if !is_known_checklist_item(item_id) {
            return Err(Error::UnknownChecklistItem(item_id.to_string()));
        }
        let checklist = self.checklist.get_or_insert_with(Checklist::default);
        checklist.set_note(item_id, note);
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        // Keep updatedAt monotonic even when two edits land in the same millisecond.
        self.updated_at = unix_millis_now().max(self.updated_at);
    }
}

impl Default for Intervention {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a field value, falling back to the default when it has an
/// unexpected shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|error| {
        tracing::debug!("Replacing malformed intervention field with default: {error}");
        T::default()
    }))
}

/// Decode a JSON array of records, skipping elements without a usable
/// `id` and `createdAt`.
///
/// Persisted and shared histories are written by other clients and older
/// revisions; one unreadable record must not hide the rest.
pub fn decode_records(values: Vec<Value>) -> Vec<Intervention> {
    let total = values.len();
    let records = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Intervention>(value) {
            Ok(record) if !record.id.as_str().trim().is_empty() => Some(record),
            Ok(_) => None,
            Err(error) => {
                tracing::debug!("Skipping unreadable intervention record: {error}");
                None
            }
        })
        .collect::<Vec<_>>();

    if records.len() != total {
        tracing::warn!(
            "Skipped {} of {} intervention records that could not be decoded",
            total - records.len(),
            total
        );
    }
    records
}

/// Serde adapter for `history` arrays that tolerates malformed elements.
/// A `null` history reads as empty.
pub(crate) fn deserialize_records<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<Intervention>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(values.map(decode_records).unwrap_or_default())
}
