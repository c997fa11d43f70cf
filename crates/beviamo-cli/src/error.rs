use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] beviamo_core::Error),
    #[error(transparent)]
    Transport(#[from] beviamo_core::remote::TransportError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Station not found: {0}")]
    StationNotFound(String),
    #[error("Photo not found on current draft: {0}")]
    PhotoNotFound(String),
    #[error("Unsupported photo file: {0}")]
    UnsupportedPhoto(String),
    #[error("Nothing to change. Pass at least one of --station, --type, --note, --altro")]
    NothingToSet,
    #[error("Sync failed: {0}")]
    SyncFailed(String),
    #[error("Import failed: {0}")]
    ImportFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Workspace key is not set. Run `beviamo workspace set <key>` first.")]
    WorkspaceNotSet,
    #[error(
        "Bucket service is not configured. Run `beviamo config init --bucket-url <url>` or set BEVIAMO_BUCKET_URL."
    )]
    BucketNotConfigured,
}
