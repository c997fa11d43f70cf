//! Shared sync phase type.

use std::fmt;

/// Phase of the current sync cycle, as seen by front ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncPhase {
    #[default]
    Idle,
    Fetching,
    Reconciling,
    Pushing,
    Error,
}

impl SyncPhase {
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Fetching | Self::Reconciling | Self::Pushing)
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Reconciling => "reconciling",
            Self::Pushing => "pushing",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}
