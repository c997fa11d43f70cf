//! Data models for Beviamo

mod checklist;
mod intervention;
mod station;
mod workspace;

pub use checklist::{
    checklist_item, is_known_checklist_item, Checklist, ChecklistItem, ChecklistSection,
    CHECKLIST_SECTIONS,
};
pub use intervention::{
    decode_records, Intervention, InterventionId, InterventionType, Photo, SyncStatus,
};
pub(crate) use intervention::{deserialize_records, lenient};
pub use station::{find_station, search_stations, Station, STATIONS};
pub use workspace::WorkspaceKey;
