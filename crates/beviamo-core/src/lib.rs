//! beviamo-core - Core library for Beviamo
//!
//! This crate contains the intervention models, the local store, the shared
//! bucket client, and the offline-first sync engine used by every Beviamo
//! front end.

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod state;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Intervention, InterventionId, WorkspaceKey};
pub use sync::{SyncEngine, SyncReport};
