//! HTTP bucket client.
//!
//! Talks to a JSON bucket service (Pantry-style) where each workspace key
//! addresses one document at `{base_url}/{workspace_key}`: `GET` reads it,
//! `POST` replaces it.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

use super::{BucketDocument, BucketTransport, FetchOutcome, RetryPolicy, TransportError};
use crate::models::WorkspaceKey;
use crate::util::{compact_text, is_http_url, normalize_text_option};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HttpBucketClient {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpBucketClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self {
            base_url: normalize_base_url(base_url.into())?,
            client: build_client(DEFAULT_REQUEST_TIMEOUT)?,
            retry: RetryPolicy::default(),
        })
    }

    /// Rebuild the underlying client with a different request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, TransportError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn bucket_url(&self, key: &WorkspaceKey) -> Result<String, TransportError> {
        if key.is_empty() {
            return Err(TransportError::InvalidConfiguration(
                "workspace key must not be empty".to_string(),
            ));
        }
        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let attempts = self.retry.attempts();
        let mut attempt = 1;
        loop {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < attempts => {
                    let delay = self.retry.delay_for_retry(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Bucket {operation} failed, retrying: {error}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchOutcome, TransportError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Bucket GET response");

        if status == StatusCode::NOT_FOUND {
            return Ok(FetchOutcome::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body = response.text().await?;
        let document = serde_json::from_str::<BucketDocument>(&body)
            .map_err(|error| TransportError::Decode(error.to_string()))?;
        Ok(FetchOutcome::Found(document))
    }

    async fn put_once(&self, url: &str, document: &BucketDocument) -> Result<(), TransportError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(document)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Bucket POST response");

        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, &body))
        }
    }
}

impl BucketTransport for HttpBucketClient {
    async fn fetch_bucket(&self, key: &WorkspaceKey) -> Result<FetchOutcome, TransportError> {
        let url = self.bucket_url(key)?;
        self.with_retry("fetch", || self.fetch_once(&url)).await
    }

    async fn put_bucket(
        &self,
        key: &WorkspaceKey,
        document: &BucketDocument,
    ) -> Result<(), TransportError> {
        let url = self.bucket_url(key)?;
        self.with_retry("put", || self.put_once(&url, document))
            .await
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client, TransportError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn status_error(status: StatusCode, body: &str) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        body: compact_text(body),
    }
}

fn normalize_base_url(raw: String) -> Result<String, TransportError> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        TransportError::InvalidConfiguration("bucket base URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(TransportError::InvalidConfiguration(
            "bucket base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> HttpBucketClient {
        HttpBucketClient::new(format!("{}/basket/", server.uri()))
            .unwrap()
            .with_retry_policy(RetryPolicy::immediate(3))
    }

    fn key() -> WorkspaceKey {
        WorkspaceKey::sanitize("team-a")
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(HttpBucketClient::new("  ").is_err());
        assert!(HttpBucketClient::new("getpantry.cloud/basket").is_err());
        let client = HttpBucketClient::new("https://example.com/basket/").unwrap();
        assert_eq!(client.base_url(), "https://example.com/basket");
    }

    #[tokio::test]
    async fn fetch_returns_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/basket/team-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "history": [{ "id": "a", "createdAt": 100 }],
                "lastUpdate": 5,
                "updatedBy": "Mario Rossi"
            })))
            .mount(&server)
            .await;

        let outcome = test_client(&server).fetch_bucket(&key()).await.unwrap();
        let FetchOutcome::Found(document) = outcome else {
            panic!("expected a document");
        };
        assert_eq!(document.history.len(), 1);
        assert_eq!(document.updated_by, "Mario Rossi");
    }

    #[tokio::test]
    async fn fetch_maps_404_to_not_found_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/basket/team-a"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = test_client(&server).fetch_bucket(&key()).await.unwrap();
        assert_eq!(outcome, FetchOutcome::NotFound);
    }

    #[tokio::test]
    async fn fetch_retries_transient_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/basket/team-a"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/basket/team-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "history": []
            })))
            .mount(&server)
            .await;

        let outcome = test_client(&server).fetch_bucket(&key()).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Found(_)));
    }

    #[tokio::test]
    async fn fetch_gives_up_after_max_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let error = test_client(&server).fetch_bucket(&key()).await.unwrap_err();
        assert!(matches!(error, TransportError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn fetch_does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad basket"))
            .expect(1)
            .mount(&server)
            .await;

        let error = test_client(&server).fetch_bucket(&key()).await.unwrap_err();
        assert!(error.to_string().contains("bad basket"));
    }

    #[tokio::test]
    async fn fetch_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let error = test_client(&server).fetch_bucket(&key()).await.unwrap_err();
        assert!(matches!(error, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn put_posts_whole_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/basket/team-a"))
            .and(body_partial_json(serde_json::json!({
                "history": [{ "id": "a", "createdAt": 100 }],
                "updatedBy": "Mario Rossi"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let record = serde_json::from_value(serde_json::json!({ "id": "a", "createdAt": 100 }))
            .unwrap();
        let document = BucketDocument::new(vec![record], "Mario Rossi");
        test_client(&server)
            .put_bucket(&key(), &document)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_key_is_rejected_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let error = test_client(&server)
            .fetch_bucket(&WorkspaceKey::unset())
            .await
            .unwrap_err();
        assert!(matches!(error, TransportError::InvalidConfiguration(_)));
    }
}
