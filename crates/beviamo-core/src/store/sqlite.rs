//! `SQLite` implementation of `LocalStore`

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{migrations, LocalStore, KEY_DRAFT, KEY_HISTORY, KEY_LEGACY_QUEUE, KEY_WORKSPACE};
use crate::error::Result;
use crate::models::{decode_records, Checklist, Intervention, WorkspaceKey};
use crate::sync::merge::merge_records;

/// Key-value store backed by a single `SQLite` file
pub struct SqliteLocalStore {
    conn: Mutex<Connection>,
    seed_history: Vec<Intervention>,
}

impl SqliteLocalStore {
    /// Open the store at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations and folds any legacy queue into history.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        tracing::debug!("Opened local store at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Decode a raw history slot, falling back to the seed history.
    fn decode_history(&self, raw: Option<String>) -> Vec<Intervention> {
        let Some(raw) = raw else {
            return self.seed_history.clone();
        };

        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => merge_records(decode_records(values)),
            Err(error) => {
                tracing::warn!("Stored history is corrupt, using seed history: {error}");
                self.seed_history.clone()
            }
        }
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrations::run(&conn)?;

        let store = Self {
            conn: Mutex::new(conn),
            seed_history: Vec::new(),
        };
        store.fold_legacy_queue()?;
        Ok(store)
    }

    /// History returned on first run, before anything was saved
    #[must_use]
    pub fn with_seed_history(mut self, seed: Vec<Intervention>) -> Self {
        self.seed_history = merge_records(seed);
        self
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, crate::util::unix_millis_now()],
        )?;
        Ok(())
    }

    fn remove_value(&self, key: &str) -> Result<()> {
        self.conn()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn read_slot(&self, key: &str) -> Option<String> {
        match self.get_value(key) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!("Failed to read local slot '{key}': {error}");
                None
            }
        }
    }

    /// Older revisions kept unsent reports in a separate queue slot.
    fn fold_legacy_queue(&self) -> Result<()> {
        let Some(raw) = self.get_value(KEY_LEGACY_QUEUE)? else {
            return Ok(());
        };

        let queued = match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(values) => decode_records(values),
            Err(error) => {
                tracing::warn!("Discarding unreadable legacy queue: {error}");
                Vec::new()
            }
        };

        if !queued.is_empty() {
            let count = queued.len();
            self.update_history(|history| {
                let current = std::mem::take(history);
                *history = merge_records(queued.into_iter().chain(current));
            })?;
            tracing::info!("Moved {count} legacy queued interventions into history");
        }

        self.remove_value(KEY_LEGACY_QUEUE)
    }
}

/// Parse a persisted draft, repairing a missing or malformed checklist.
fn parse_draft(raw: &str) -> Option<Intervention> {
    let mut value = serde_json::from_str::<Value>(raw).ok()?;
    if let Some(object) = value.as_object_mut() {
        let malformed_checklist = object
            .get("checklist")
            .is_some_and(|checklist| {
                serde_json::from_value::<Checklist>(checklist.clone()).is_err()
            });
        if malformed_checklist {
            object.remove("checklist");
        }
    }

    let mut draft = serde_json::from_value::<Intervention>(value).ok()?;
    if draft.id.as_str().trim().is_empty() {
        return None;
    }
    if draft.repair() {
        tracing::warn!("Repaired missing checklist on stored draft {}", draft.id);
    }
    Some(draft)
}

impl LocalStore for SqliteLocalStore {
    fn save_draft(&self, draft: &Intervention) -> Result<()> {
        let serialized = serde_json::to_string(draft)?;
        self.set_value(KEY_DRAFT, &serialized)
    }

    fn load_draft(&self) -> Intervention {
        let Some(raw) = self.read_slot(KEY_DRAFT) else {
            return Intervention::new();
        };

        parse_draft(&raw).unwrap_or_else(|| {
            tracing::warn!("Stored draft is corrupt; starting a new intervention");
            Intervention::new()
        })
    }

    fn clear_draft(&self) -> Result<()> {
        self.remove_value(KEY_DRAFT)
    }

    fn save_history(&self, history: &[Intervention]) -> Result<()> {
        let serialized = serde_json::to_string(history)?;
        self.set_value(KEY_HISTORY, &serialized)
    }

    fn load_history(&self) -> Vec<Intervention> {
        self.decode_history(self.read_slot(KEY_HISTORY))
    }

    fn update_history<R>(&self, update: impl FnOnce(&mut Vec<Intervention>) -> R) -> Result<R> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let raw = tx
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![KEY_HISTORY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let mut history = self.decode_history(raw);
        let output = update(&mut history);

        let serialized = serde_json::to_string(&history)?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![KEY_HISTORY, serialized, crate::util::unix_millis_now()],
        )?;
        tx.commit()?;
        Ok(output)
    }

    fn workspace_key(&self) -> WorkspaceKey {
        self.read_slot(KEY_WORKSPACE)
            .map(|raw| WorkspaceKey::sanitize(&raw))
            .unwrap_or_default()
    }

    fn set_workspace_key(&self, raw: &str) -> Result<WorkspaceKey> {
        let key = WorkspaceKey::sanitize(raw);
        if key.is_empty() {
            self.remove_value(KEY_WORKSPACE)?;
        } else {
            self.set_value(KEY_WORKSPACE, key.as_str())?;
        }
        tracing::info!("Workspace key set to '{key}'");
        Ok(key)
    }
}
