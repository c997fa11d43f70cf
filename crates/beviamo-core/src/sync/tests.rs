use std::sync::Mutex;

use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use super::*;
use crate::models::{find_station, InterventionId};
use crate::remote::TransportError;
use crate::store::SqliteLocalStore;

/// In-memory bucket standing in for the HTTP service
#[derive(Default)]
struct FakeBucket {
    document: Mutex<Option<BucketDocument>>,
    fail_fetch: Mutex<bool>,
    fail_put: Mutex<bool>,
    fetches: Mutex<usize>,
    puts: Mutex<usize>,
    gate: Option<Notify>,
}

impl FakeBucket {
    fn with_history(history: Vec<Intervention>) -> Self {
        let bucket = Self::default();
        *bucket.document.lock().unwrap() = Some(BucketDocument::new(history, "Remote"));
        bucket
    }

    fn with_document(raw: &str) -> Self {
        let bucket = Self::default();
        *bucket.document.lock().unwrap() = Some(serde_json::from_str(raw).unwrap());
        bucket
    }

    fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::with_history(Vec::new())
        }
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    fn remote_ids(&self) -> Vec<String> {
        self.document
            .lock()
            .unwrap()
            .as_ref()
            .map(|document| {
                document
                    .history
                    .iter()
                    .map(|record| record.id.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn remote_document(&self) -> Option<BucketDocument> {
        self.document.lock().unwrap().clone()
    }

    fn set_fail_fetch(&self, fail: bool) {
        *self.fail_fetch.lock().unwrap() = fail;
    }

    fn set_fail_put(&self, fail: bool) {
        *self.fail_put.lock().unwrap() = fail;
    }

    fn puts(&self) -> usize {
        *self.puts.lock().unwrap()
    }

    fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

impl BucketTransport for FakeBucket {
    async fn fetch_bucket(
        &self,
        _key: &WorkspaceKey,
    ) -> std::result::Result<FetchOutcome, TransportError> {
        *self.fetches.lock().unwrap() += 1;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if *self.fail_fetch.lock().unwrap() {
            return Err(TransportError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(self
            .document
            .lock()
            .unwrap()
            .clone()
            .map_or(FetchOutcome::NotFound, FetchOutcome::Found))
    }

    async fn put_bucket(
        &self,
        _key: &WorkspaceKey,
        document: &BucketDocument,
    ) -> std::result::Result<(), TransportError> {
        if *self.fail_put.lock().unwrap() {
            return Err(TransportError::Status {
                status: 500,
                body: "write failed".to_string(),
            });
        }
        *self.puts.lock().unwrap() += 1;
        *self.document.lock().unwrap() = Some(document.clone());
        Ok(())
    }
}

fn record(id: &str, created_at: i64) -> Intervention {
    let mut record = Intervention::new();
    record.id = id.parse::<InterventionId>().unwrap();
    record.created_at = created_at;
    record.updated_at = created_at;
    record
}

fn ids(records: &[Intervention]) -> Vec<String> {
    records.iter().map(|record| record.id.to_string()).collect()
}

fn engine(bucket: FakeBucket) -> SyncEngine<SqliteLocalStore, FakeBucket> {
    let store = SqliteLocalStore::open_in_memory().unwrap();
    SyncEngine::new(
        store,
        bucket,
        SyncSettings::new(WorkspaceKey::sanitize("team-a"), Some("Mario Rossi".to_string())),
    )
}

fn local_only_engine(bucket: FakeBucket) -> SyncEngine<SqliteLocalStore, FakeBucket> {
    let store = SqliteLocalStore::open_in_memory().unwrap();
    SyncEngine::new(store, bucket, SyncSettings::local_only())
}

fn submittable_draft() -> Intervention {
    let mut draft = Intervention::new();
    draft.select_station(find_station("CA-001").unwrap());
    draft
}

#[tokio::test(flavor = "current_thread")]
async fn sync_merges_union_and_pushes_local_only_records() {
    let engine = engine(FakeBucket::with_history(vec![record("r1", 300), record("shared", 100)]));
    engine
        .store()
        .save_history(&[record("l1", 200), record("shared", 100)])
        .unwrap();

    let report = engine.sync_with_cloud().await;

    assert_eq!(report, SyncReport::succeeded(1));
    assert_eq!(ids(&engine.history()), vec!["r1", "l1", "shared"]);
    assert_eq!(engine.transport().puts(), 1);
    assert_eq!(engine.transport().remote_ids(), vec!["r1", "l1", "shared"]);
    assert_eq!(engine.phase(), SyncPhase::Idle);
}

#[tokio::test(flavor = "current_thread")]
async fn sync_is_idempotent_once_converged() {
    let engine = engine(FakeBucket::with_history(vec![record("a", 100)]));
    engine.store().save_history(&[record("b", 200)]).unwrap();

    let first = engine.sync_with_cloud().await;
    let history_after_first = engine.history();
    let puts_after_first = engine.transport().puts();

    let second = engine.sync_with_cloud().await;

    assert_eq!(first.added, 1);
    assert_eq!(second, SyncReport::succeeded(0));
    assert_eq!(engine.history(), history_after_first);
    assert_eq!(engine.transport().puts(), puts_after_first);
}

#[tokio::test(flavor = "current_thread")]
async fn sync_skips_push_when_bucket_already_has_everything() {
    let engine = engine(FakeBucket::with_history(vec![record("a", 100), record("b", 200)]));
    engine.store().save_history(&[record("a", 100)]).unwrap();

    let report = engine.sync_with_cloud().await;

    assert_eq!(report, SyncReport::succeeded(1));
    assert_eq!(engine.transport().puts(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn sync_creates_missing_bucket_from_local_history() {
    let engine = engine(FakeBucket::default());
    engine
        .store()
        .save_history(&[record("a", 100), record("b", 200)])
        .unwrap();

    let report = engine.sync_with_cloud().await;

    assert_eq!(report, SyncReport::succeeded(0));
    assert_eq!(engine.transport().remote_ids(), vec!["b", "a"]);
    let document = engine.transport().remote_document().unwrap();
    assert_eq!(document.updated_by, "Mario Rossi");
    assert!(document.last_update > 0);
}

#[tokio::test(flavor = "current_thread")]
async fn sync_without_workspace_key_does_nothing() {
    let engine = local_only_engine(FakeBucket::with_history(vec![record("a", 100)]));

    let report = engine.sync_with_cloud().await;

    assert!(!report.success);
    assert_eq!(report.added, 0);
    assert_eq!(engine.transport().fetches(), 0);
    assert!(engine.history().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn sync_failure_leaves_local_history_untouched() {
    let engine = engine(FakeBucket::with_history(vec![record("a", 100)]));
    engine.store().save_history(&[record("b", 200)]).unwrap();
    engine.transport().set_fail_fetch(true);

    let report = engine.sync_with_cloud().await;

    assert!(!report.success);
    assert!(report.error.unwrap().contains("503"));
    assert_eq!(ids(&engine.history()), vec!["b"]);
    assert_eq!(engine.phase(), SyncPhase::Idle);
}

#[tokio::test(flavor = "current_thread")]
async fn overlapping_sync_trigger_is_dropped() {
    let engine = engine(FakeBucket::gated());

    let (first, (second, busy)) = tokio::join!(engine.sync_with_cloud(), async {
        let report = engine.sync_with_cloud().await;
        let busy = engine.phase().is_busy();
        engine.transport().release();
        (report, busy)
    });

    assert!(busy);
    assert!(first.success);
    assert!(!second.success);
    assert!(!engine.phase().is_busy());
    assert_eq!(engine.transport().fetches(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn push_keeps_remote_records_from_newer_clients() {
    let engine = engine(FakeBucket::with_document(
        r#"{"history":[
            {"id":"r1","createdAt":100,"tipoIntervento":"Sostituzione Filtri","tecnico":"Luca"},
            {"id":"r2","createdAt":90,"syncStatus":"pending"}
        ],"lastUpdate":1,"updatedBy":"Luca"}"#,
    ));

    let report = engine.push_to_cloud(record("x", 200)).await;

    assert_eq!(report, SyncReport::succeeded(2));
    assert_eq!(ids(&engine.history()), vec!["x", "r1", "r2"]);
    assert_eq!(engine.transport().remote_ids(), vec!["x", "r1", "r2"]);

    let pushed = serde_json::to_value(engine.transport().remote_document().unwrap()).unwrap();
    assert_eq!(pushed["history"][1]["tipoIntervento"], "Sostituzione Filtri");
    assert_eq!(pushed["history"][1]["tecnico"], "Luca");
}

#[tokio::test(flavor = "current_thread")]
async fn sync_tolerates_bucket_with_null_history() {
    let engine = engine(FakeBucket::with_document(r#"{"history":null,"lastUpdate":1}"#));
    engine.store().save_history(&[record("a", 10)]).unwrap();

    let report = engine.sync_with_cloud().await;

    assert_eq!(report, SyncReport::succeeded(0));
    assert_eq!(engine.transport().remote_ids(), vec!["a"]);
}

#[tokio::test(flavor = "current_thread")]
async fn push_during_running_sync_is_not_overwritten() {
    let engine = engine(FakeBucket::gated());
    *engine.transport().document.lock().unwrap() =
        Some(BucketDocument::new(vec![record("remote", 50)], "Remote"));

    let (sync_report, push_report, ()) = tokio::join!(
        engine.sync_with_cloud(),
        engine.push_to_cloud(record("x", 200)),
        async {
            // Wake the running sync, then leave a permit for the queued push.
            engine.transport().release();
            engine.transport().release();
        }
    );

    assert_eq!(sync_report, SyncReport::succeeded(1));
    assert!(push_report.success);
    assert_eq!(ids(&engine.history()), vec!["x", "remote"]);
    assert_eq!(engine.transport().remote_ids(), vec!["x", "remote"]);
}

#[tokio::test(flavor = "current_thread")]
async fn push_saves_locally_before_any_network_call() {
    let engine = engine(FakeBucket::with_history(vec![record("remote", 50)]));
    engine.transport().set_fail_fetch(true);

    let report = engine.push_to_cloud(record("x", 100)).await;

    assert!(!report.success);
    assert_eq!(ids(&engine.history()), vec!["x"]);
    assert_eq!(engine.transport().puts(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn push_failure_never_loses_the_record() {
    let engine = engine(FakeBucket::with_history(Vec::new()));
    engine.transport().set_fail_put(true);

    let report = engine.push_to_cloud(record("x", 100)).await;
    assert!(!report.success);
    assert_eq!(ids(&engine.history()), vec!["x"]);

    engine.transport().set_fail_put(false);
    let report = engine.sync_with_cloud().await;
    assert!(report.success);
    assert_eq!(engine.transport().remote_ids(), vec!["x"]);
}

#[tokio::test(flavor = "current_thread")]
async fn push_merges_remote_records_before_writing() {
    let engine = engine(FakeBucket::with_history(vec![record("remote", 300)]));
    engine.store().save_history(&[record("old", 100)]).unwrap();

    let report = engine.push_to_cloud(record("x", 200)).await;

    assert_eq!(report, SyncReport::succeeded(1));
    assert_eq!(ids(&engine.history()), vec!["remote", "x", "old"]);
    assert_eq!(engine.transport().remote_ids(), vec!["remote", "x", "old"]);
}

#[tokio::test(flavor = "current_thread")]
async fn push_replaces_existing_copy_with_same_id() {
    let engine = engine(FakeBucket::with_history(Vec::new()));
    let mut original = record("x", 100);
    original.set_note("first");
    engine.store().save_history(&[original]).unwrap();

    let mut edited = record("x", 100);
    edited.set_note("second");
    let report = engine.push_to_cloud(edited).await;

    assert!(report.success);
    let history = engine.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].note, "second");
}

#[tokio::test(flavor = "current_thread")]
async fn push_without_workspace_key_is_local_success() {
    let engine = local_only_engine(FakeBucket::default());

    let report = engine.push_to_cloud(record("x", 100)).await;

    assert_eq!(report, SyncReport::succeeded(0));
    assert_eq!(ids(&engine.history()), vec!["x"]);
    assert_eq!(engine.transport().fetches(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn submit_rejects_draft_without_station() {
    let engine = engine(FakeBucket::default());

    let error = engine.submit_draft(Intervention::new()).await.unwrap_err();

    assert!(matches!(error, Error::MissingStation));
    assert!(engine.history().is_empty());
    assert_eq!(engine.transport().fetches(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn submit_rotates_draft_after_success() {
    let engine = engine(FakeBucket::with_history(Vec::new()));
    let draft = submittable_draft();
    engine.store().save_draft(&draft).unwrap();

    let submission = engine.submit_draft(draft.clone()).await.unwrap();

    assert!(submission.report.success);
    assert_eq!(submission.submitted.id, draft.id);
    assert_eq!(submission.submitted.sync_status, SyncStatus::Synced);
    assert_ne!(submission.draft.id, draft.id);
    assert_eq!(engine.store().load_draft().id, submission.draft.id);
    assert_eq!(ids(&engine.history()), vec![draft.id.to_string()]);
}

#[tokio::test(flavor = "current_thread")]
async fn submit_keeps_draft_for_retry_after_failure() {
    let engine = engine(FakeBucket::with_history(Vec::new()));
    engine.transport().set_fail_put(true);
    let draft = submittable_draft();

    let submission = engine.submit_draft(draft.clone()).await.unwrap();

    assert!(!submission.report.success);
    assert_eq!(submission.draft.id, draft.id);
    assert_eq!(engine.store().load_draft().id, draft.id);
    let history = engine.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sync_status, SyncStatus::Error);
    assert!(history[0].sync_error_message.is_some());

    engine.transport().set_fail_put(false);
    let retry = engine.submit_draft(submission.draft).await.unwrap();
    assert!(retry.report.success);
    assert_eq!(engine.history()[0].sync_status, SyncStatus::Synced);
    assert_eq!(engine.history()[0].sync_error_message, None);
}

#[tokio::test(flavor = "current_thread")]
async fn submit_marks_record_synced_only_after_bucket_accepts_it() {
    let engine = engine(FakeBucket::gated());
    let draft = submittable_draft();

    let (submission, status_during_push) = tokio::join!(engine.submit_draft(draft), async {
        let status = engine.history()[0].sync_status;
        engine.transport().release();
        status
    });

    assert_eq!(status_during_push, SyncStatus::Queued);
    assert_eq!(submission.unwrap().submitted.sync_status, SyncStatus::Synced);
    assert_eq!(engine.history()[0].sync_status, SyncStatus::Synced);
}

#[tokio::test(flavor = "current_thread")]
async fn submit_without_workspace_key_queues_locally() {
    let engine = local_only_engine(FakeBucket::default());

    let submission = engine.submit_draft(submittable_draft()).await.unwrap();

    assert!(submission.report.success);
    assert_eq!(submission.submitted.sync_status, SyncStatus::Queued);
    assert_eq!(engine.history().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn set_workspace_key_enables_remote_sync() {
    let engine = local_only_engine(FakeBucket::with_history(vec![record("a", 100)]));

    let key = engine.set_workspace_key(" team/b ").unwrap();
    let report = engine.sync_with_cloud().await;

    assert_eq!(key.as_str(), "teamb");
    assert_eq!(engine.store().workspace_key(), key);
    assert_eq!(report, SyncReport::succeeded(1));
}

#[tokio::test(flavor = "current_thread")]
async fn engine_reads_workspace_key_from_store() {
    let store = SqliteLocalStore::open_in_memory().unwrap();
    store.set_workspace_key("team-c").unwrap();

    let engine = SyncEngine::from_store(store, FakeBucket::default(), None);

    assert_eq!(engine.settings().workspace_key.as_str(), "team-c");
    assert_eq!(engine.settings().updated_by(), crate::config::UNKNOWN_TECHNICIAN);
}

#[test]
fn report_serializes_without_empty_error() {
    let value = serde_json::to_value(SyncReport::succeeded(2)).unwrap();
    assert_eq!(value, serde_json::json!({ "success": true, "added": 2 }));
}
