//! Offline-first synchronization between the local history and the shared
//! workspace bucket.
//!
//! The protocol is a whole-document replace: a cycle fetches the bucket,
//! merges remote-only records into local history by id, and writes the full
//! merged history back when the bucket is missing records this client has.
//!
//! Known limitation: two clients that both hold unseen local records and push
//! at the same moment can overwrite each other, because each `POST` replaces
//! the bucket with that client's snapshot. Fetching right before every push
//! narrows the window but cannot close it.

pub mod merge;

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::config::SyncSettings;
use crate::error::{Error, Result};
use crate::models::{Intervention, SyncStatus, WorkspaceKey};
use crate::remote::{BucketDocument, BucketTransport, FetchOutcome};
use crate::state::SyncPhase;
use crate::store::LocalStore;
use merge::{merge_records, missing_from};

/// Structured outcome handed back to front ends
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub success: bool,
    /// Records pulled from the bucket (or import file) into local history
    pub added: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncReport {
    #[must_use]
    pub const fn succeeded(added: usize) -> Self {
        Self {
            success: true,
            added,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: &Error) -> Self {
        Self {
            success: false,
            added: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Result of submitting the current draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub report: SyncReport,
    /// The record as stored in local history
    pub submitted: Intervention,
    /// The draft now held in the draft slot: a fresh record after success,
    /// the submitted record again after a failed push.
    pub draft: Intervention,
}

pub struct SyncEngine<S, T> {
    store: S,
    transport: T,
    settings: Mutex<SyncSettings>,
    phase: Mutex<SyncPhase>,
    in_flight: AsyncMutex<()>,
}

impl<S: LocalStore, T: BucketTransport> SyncEngine<S, T> {
    pub fn new(store: S, transport: T, settings: SyncSettings) -> Self {
        Self {
            store,
            transport,
            settings: Mutex::new(settings),
            phase: Mutex::new(SyncPhase::Idle),
            in_flight: AsyncMutex::new(()),
        }
    }

    /// Build an engine whose workspace key is read from the store
    pub fn from_store(store: S, transport: T, technician: Option<String>) -> Self {
        let settings = SyncSettings::new(store.workspace_key(), technician);
        Self::new(store, transport, settings)
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Local history, newest first
    pub fn history(&self) -> Vec<Intervention> {
        self.store.load_history()
    }

    /// Persist a new workspace key and use it for subsequent cycles
    pub fn set_workspace_key(&self, raw: &str) -> Result<WorkspaceKey> {
        let key = self.store.set_workspace_key(raw)?;
        self.settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .workspace_key = key.clone();
        Ok(key)
    }

    /// Pull remote-only records into local history and push back records
    /// the bucket is missing.
    ///
    /// A trigger that arrives while another cycle is running is dropped.
    pub async fn sync_with_cloud(&self) -> SyncReport {
        let settings = self.settings();
        if !settings.is_remote_enabled() {
            tracing::debug!("Skipping sync: no workspace key configured");
            return SyncReport::failed(&Error::SyncNotConfigured);
        }

        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::info!("Sync already in progress; dropping trigger");
            return SyncReport::failed(&Error::SyncInProgress);
        };

        let result = self.run_cycle(&settings, false).await;
        self.finish(result)
    }

    /// Store a record in local history, then share it through the bucket.
    ///
    /// The local write always happens first and is never rolled back. A
    /// failed push leaves the record stored locally for a later retry.
    pub async fn push_to_cloud(&self, intervention: Intervention) -> SyncReport {
        let id = intervention.id.clone();
        if let Err(error) = self.store_locally(intervention) {
            tracing::error!("Failed to save intervention {id} locally: {error}");
            return SyncReport::failed(&error);
        }

        let settings = self.settings();
        if !settings.is_remote_enabled() {
            tracing::info!("Intervention {id} saved locally (remote sync not configured)");
            return SyncReport::succeeded(0);
        }

        // Wait for an in-flight cycle instead of dropping the push.
        let _guard = self.in_flight.lock().await;
        let result = self.run_cycle(&settings, true).await;
        self.finish(result)
    }

    /// Validate and submit a draft, then rotate the draft slot.
    ///
    /// The record is stored as `queued` and only marked `synced` once the
    /// bucket accepted it.
    pub async fn submit_draft(&self, mut draft: Intervention) -> Result<Submission> {
        draft.ensure_submittable()?;

        let remote = self.settings().is_remote_enabled();
        draft.sync_status = SyncStatus::Queued;
        draft.sync_error_message = None;

        let report = self.push_to_cloud(draft.clone()).await;
        if report.success {
            if remote {
                draft.sync_status = SyncStatus::Synced;
                self.store_locally(draft.clone())?;
            }
            self.store.clear_draft()?;
            let next = self.store.load_draft();
            self.store.save_draft(&next)?;
            return Ok(Submission {
                report,
                submitted: draft,
                draft: next,
            });
        }

        draft.sync_status = SyncStatus::Error;
        draft.sync_error_message.clone_from(&report.error);
        if let Err(error) = self.store_locally(draft.clone()) {
            tracing::warn!("Failed to record sync error on {}: {error}", draft.id);
        }
        self.store.save_draft(&draft)?;
        Ok(Submission {
            report,
            submitted: draft.clone(),
            draft,
        })
    }

    /// Insert or replace one record in local history atomically.
    fn store_locally(&self, intervention: Intervention) -> Result<()> {
        self.store.update_history(|history| {
            let current = std::mem::take(history);
            // The submitted copy is the latest local write, so it goes last.
            *history = merge_records(current.into_iter().chain(std::iter::once(intervention)));
        })
    }

    async fn run_cycle(&self, settings: &SyncSettings, always_push: bool) -> Result<usize> {
        let key = &settings.workspace_key;

        self.set_phase(SyncPhase::Fetching);
        let outcome = self.transport.fetch_bucket(key).await?;

        let remote = match outcome {
            FetchOutcome::NotFound => {
                tracing::info!("Bucket '{key}' does not exist yet; creating it");
                let local = self.store.load_history();
                self.push_history(settings, local).await?;
                return Ok(0);
            }
            FetchOutcome::Found(document) => document.history,
        };

        self.set_phase(SyncPhase::Reconciling);
        // Merge and save in one store transaction so a concurrent local write
        // cannot be overwritten by this cycle's snapshot.
        let (added, needs_push, merged) = self.store.update_history(|history| {
            let new_from_cloud = missing_from(&remote, history.as_slice())
                .into_iter()
                .cloned()
                .collect::<Vec<_>>();
            let added = new_from_cloud.len();
            if added > 0 {
                let current = std::mem::take(history);
                *history = merge_records(new_from_cloud.into_iter().chain(current));
            }
            let needs_push = always_push || !missing_from(history.as_slice(), &remote).is_empty();
            (added, needs_push, history.clone())
        })?;
        if added > 0 {
            tracing::info!("Merged {added} interventions from bucket '{key}'");
        }

        if needs_push {
            self.push_history(settings, merged).await?;
        }
        Ok(added)
    }

    async fn push_history(&self, settings: &SyncSettings, history: Vec<Intervention>) -> Result<()> {
        self.set_phase(SyncPhase::Pushing);
        let count = history.len();
        let document = BucketDocument::new(history, settings.updated_by());
        self.transport
            .put_bucket(&settings.workspace_key, &document)
            .await?;
        tracing::debug!("Pushed {count} interventions to bucket '{}'", settings.workspace_key);
        Ok(())
    }

    fn finish(&self, result: Result<usize>) -> SyncReport {
        match result {
            Ok(added) => {
                self.set_phase(SyncPhase::Idle);
                tracing::info!(added, "Sync completed");
                SyncReport::succeeded(added)
            }
            Err(error) => {
                self.set_phase(SyncPhase::Error);
                tracing::warn!("Sync failed: {error}");
                self.set_phase(SyncPhase::Idle);
                SyncReport::failed(&error)
            }
        }
    }

    fn set_phase(&self, phase: SyncPhase) {
        let mut current = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != phase {
            tracing::debug!("Sync phase {} -> {}", *current, phase);
            *current = phase;
        }
    }
}

#[cfg(test)]
mod tests;
