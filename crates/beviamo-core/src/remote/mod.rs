//! Transport to the shared remote bucket.
//!
//! A bucket is one JSON document per workspace key holding the team's whole
//! intervention history. It is always read and written as a unit.

mod http;
mod retry;

pub use http::{HttpBucketClient, DEFAULT_REQUEST_TIMEOUT};
pub use retry::RetryPolicy;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{deserialize_records, lenient, Intervention, WorkspaceKey};

/// Wire shape of a bucket: `{ history, lastUpdate, updatedBy }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDocument {
    #[serde(default, deserialize_with = "deserialize_records")]
    pub history: Vec<Intervention>,
    /// Time of the last full write (Unix ms)
    #[serde(default, deserialize_with = "lenient")]
    pub last_update: i64,
    /// Technician that performed the last write
    #[serde(default, deserialize_with = "lenient")]
    pub updated_by: String,
}

impl BucketDocument {
    #[must_use]
    pub fn new(history: Vec<Intervention>, updated_by: impl Into<String>) -> Self {
        Self {
            history,
            last_update: crate::util::unix_millis_now(),
            updated_by: updated_by.into(),
        }
    }
}

/// Result of reading a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(BucketDocument),
    /// The bucket has never been written. Expected, not an error.
    NotFound,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid bucket configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Bucket HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Bucket API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid bucket payload: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether a retry could plausibly succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidConfiguration(_) | Self::Decode(_) => false,
        }
    }
}

/// Fetch/overwrite primitives against one shared bucket per workspace key.
///
/// Callers must not invoke either primitive with an empty key.
#[allow(async_fn_in_trait)]
pub trait BucketTransport {
    /// Read the whole bucket document
    async fn fetch_bucket(&self, key: &WorkspaceKey) -> Result<FetchOutcome, TransportError>;

    /// Replace the whole bucket document
    async fn put_bucket(
        &self,
        key: &WorkspaceKey,
        document: &BucketDocument,
    ) -> Result<(), TransportError>;
}

/// An absent transport fails every call, so records stay local until a
/// bucket service is configured.
impl<T: BucketTransport> BucketTransport for Option<T> {
    async fn fetch_bucket(&self, key: &WorkspaceKey) -> Result<FetchOutcome, TransportError> {
        match self {
            Some(transport) => transport.fetch_bucket(key).await,
            None => Err(unconfigured()),
        }
    }

    async fn put_bucket(
        &self,
        key: &WorkspaceKey,
        document: &BucketDocument,
    ) -> Result<(), TransportError> {
        match self {
            Some(transport) => transport.put_bucket(key, document).await,
            None => Err(unconfigured()),
        }
    }
}

fn unconfigured() -> TransportError {
    TransportError::InvalidConfiguration("no bucket service URL configured".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_document_uses_wire_field_names() {
        let document = BucketDocument {
            history: Vec::new(),
            last_update: 42,
            updated_by: "Mario Rossi".to_string(),
        };
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "history": [], "lastUpdate": 42, "updatedBy": "Mario Rossi" })
        );
    }

    #[test]
    fn bucket_document_tolerates_missing_fields_and_bad_records() {
        let document: BucketDocument = serde_json::from_str("{}").unwrap();
        assert!(document.history.is_empty());

        let document: BucketDocument = serde_json::from_str(
            r#"{"history":[{"id":"a","createdAt":1},{"broken":true}],"lastUpdate":7}"#,
        )
        .unwrap();
        assert_eq!(document.history.len(), 1);
        assert_eq!(document.last_update, 7);
        assert!(document.updated_by.is_empty());
    }

    #[test]
    fn bucket_document_with_null_fields_reads_as_empty() {
        let document: BucketDocument =
            serde_json::from_str(r#"{"history":null,"lastUpdate":1,"updatedBy":null}"#).unwrap();
        assert!(document.history.is_empty());
        assert_eq!(document.last_update, 1);
        assert!(document.updated_by.is_empty());
    }

    #[test]
    fn bucket_document_keeps_records_it_cannot_fully_read() {
        let document: BucketDocument = serde_json::from_str(
            r#"{"history":[
                {"id":"r1","createdAt":100,"tipoIntervento":"Sostituzione Filtri"},
                {"id":"r2","createdAt":90,"syncStatus":"pending"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(document.history.len(), 2);

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["history"][0]["tipoIntervento"], "Sostituzione Filtri");
    }

    #[test]
    fn retryable_errors() {
        let busy = TransportError::Status {
            status: 503,
            body: String::new(),
        };
        let bad_request = TransportError::Status {
            status: 400,
            body: String::new(),
        };
        assert!(busy.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!TransportError::Decode("x".to_string()).is_retryable());
    }

    #[tokio::test]
    async fn missing_transport_fails_without_panicking() {
        let transport: Option<HttpBucketClient> = None;
        let error = transport
            .fetch_bucket(&WorkspaceKey::sanitize("team"))
            .await
            .unwrap_err();
        assert!(matches!(error, TransportError::InvalidConfiguration(_)));
        assert!(!error.is_retryable());
    }
}
