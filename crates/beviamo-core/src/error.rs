//! Error types for beviamo-core

use thiserror::Error;

use crate::remote::TransportError;

/// Result type alias using beviamo-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in beviamo-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error from the local store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote bucket transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A report cannot be submitted before a station is selected
    #[error("No station selected for this intervention")]
    MissingStation,

    /// Checklist item id outside the known catalog
    #[error("Unknown checklist item: {0}")]
    UnknownChecklistItem(String),

    /// No workspace key configured for remote sync
    #[error("Remote sync is not configured (empty workspace key)")]
    SyncNotConfigured,

    /// Another sync cycle is already running
    #[error("A sync cycle is already in progress")]
    SyncInProgress,
}
