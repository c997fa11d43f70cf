//! Workspace key selecting the shared remote bucket

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static DISALLOWED_KEY_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("Invalid regex"));

/// Sanitized bucket identifier. The empty key means local-only operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WorkspaceKey(String);

impl WorkspaceKey {
    /// Build a key, dropping every character outside `[A-Za-z0-9_-]`.
    #[must_use]
    pub fn sanitize(raw: &str) -> Self {
        Self(DISALLOWED_KEY_CHARS.replace_all(raw, "").into_owned())
    }

    /// The unset key
    #[must_use]
    pub const fn unset() -> Self {
        Self(String::new())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WorkspaceKey {
    fn from(value: String) -> Self {
        Self::sanitize(&value)
    }
}

impl From<WorkspaceKey> for String {
    fn from(value: WorkspaceKey) -> Self {
        value.0
    }
}

impl fmt::Display for WorkspaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
