//! Local persistence for the draft, the history log and the workspace key.

mod migrations;
mod sqlite;

pub use sqlite::SqliteLocalStore;

use crate::error::Result;
use crate::models::{Intervention, WorkspaceKey};

/// Slot holding the in-progress draft
pub const KEY_DRAFT: &str = "interventi_casetta_current_v1";
/// Slot used by older revisions as an outbound queue; folded into history on open
pub const KEY_LEGACY_QUEUE: &str = "interventi_casetta_queue_v1";
/// Slot holding the full intervention history
pub const KEY_HISTORY: &str = "interventi_casetta_history_v1";
/// Slot holding the sanitized workspace key
pub const KEY_WORKSPACE: &str = "beviamo_workspace_key";

/// Durable client-side storage.
///
/// Loads never fail: absent or unreadable slots fall back to safe defaults so
/// a corrupt value can never lock a technician out of the app.
pub trait LocalStore {
    /// Overwrite the draft slot
    fn save_draft(&self, draft: &Intervention) -> Result<()>;

    /// Load the draft, or a fresh record when absent or corrupt
    fn load_draft(&self) -> Intervention;

    /// Remove the draft slot (idempotent)
    fn clear_draft(&self) -> Result<()>;

    /// Overwrite the history slot
    fn save_history(&self, history: &[Intervention]) -> Result<()>;

    /// Load history, newest first, or the seed set when absent or corrupt
    fn load_history(&self) -> Vec<Intervention>;

    /// Read, modify and write the history slot as one atomic step.
    ///
    /// `update` receives the current history (as `load_history` would return
    /// it) and edits it in place; the edited history is then persisted.
    /// Concurrent writers never interleave between the read and the write.
    fn update_history<R>(&self, update: impl FnOnce(&mut Vec<Intervention>) -> R) -> Result<R>;

    /// Current workspace key (empty when unset)
    fn workspace_key(&self) -> WorkspaceKey;

    /// Sanitize and persist a workspace key, returning the stored value
    fn set_workspace_key(&self, raw: &str) -> Result<WorkspaceKey>;
}
