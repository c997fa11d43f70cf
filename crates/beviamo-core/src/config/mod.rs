//! Runtime configuration handed to the sync engine.
//!
//! Front ends load these values once at process start (from their config
//! file and the local store) and pass them in explicitly; the engine never
//! reads ambient storage on its own.

use serde::{Deserialize, Serialize};

use crate::models::WorkspaceKey;
use crate::util::normalize_text_option;

/// Name written to `updatedBy` when no technician is configured.
pub const UNKNOWN_TECHNICIAN: &str = "Unknown";

/// Settings that drive remote synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Shared bucket selector; empty disables remote sync.
    #[serde(default)]
    pub workspace_key: WorkspaceKey,
    /// Technician name recorded as the bucket's last writer.
    #[serde(default)]
    pub technician: Option<String>,
}

impl SyncSettings {
    #[must_use]
    pub fn new(workspace_key: WorkspaceKey, technician: Option<String>) -> Self {
        Self {
            workspace_key,
            technician: normalize_text_option(technician),
        }
    }

    /// Settings for local-only operation
    #[must_use]
    pub fn local_only() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_remote_enabled(&self) -> bool {
        !self.workspace_key.is_empty()
    }

    /// Value for the bucket's `updatedBy` field
    #[must_use]
    pub fn updated_by(&self) -> String {
        normalize_text_option(self.technician.clone())
            .unwrap_or_else(|| UNKNOWN_TECHNICIAN.to_string())
    }
}
