//! REST client for a hosted document store.
//!
//! ## Wire format
//!
//! | Operation | Request                                         | Success response         |
//! |-----------|-------------------------------------------------|--------------------------|
//! | list      | `GET {base}/collections/{c}/documents`          | `{"documents": [{"id", "fields"}]}` |
//! | create    | `POST {base}/collections/{c}/documents` (fields) | `{"id": "..."}`          |
//! | update    | `PATCH {base}/collections/{c}/documents/{id}` (fields) | any 2xx           |
//! | delete    | `DELETE {base}/collections/{c}/documents/{id}`  | any 2xx                  |
//!
//! Collection names and document ids are percent-encoded as path segments.
//! `401`/`403` map to [`StoreError::PermissionDenied`], `404` to
//! [`StoreError::NotFound`], `429` to [`StoreError::RateLimited`].
//!
//! ## Live subscription
//!
//! The REST surface has no change feed, so [`HttpStore::subscribe`] polls the
//! listing on a fixed interval. A snapshot is delivered on the first
//! successful poll and whenever the SHA-256 digest of the listing body
//! changes. Errors are reported once per failure streak; the first successful
//! poll after a streak always re-delivers the listing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tokio::time::MissedTickBehavior;

use crate::document::{DocumentStore, RawDocument, SnapshotListener, Subscription};
use crate::error::StoreError;
use crate::retry::retry_with_backoff;

/// Unreserved path characters left unescaped in collection names and ids.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

/// Connection and retry settings for [`HttpStore`].
#[derive(Debug, Clone)]
pub struct HttpStoreOptions {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub token: Option<String>,
    /// Additional attempts after the first failure for idempotent calls.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub poll_interval: Duration,
}

impl Default for HttpStoreOptions {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            user_agent: "catsync/0.1 (catalog-sync)".to_string(),
            token: None,
            max_retries: 3,
            backoff_base_ms: 500,
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// HTTP client for the document store REST API.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: Option<String>,
    max_retries: u32,
    backoff_base_ms: u64,
    poll_interval: Duration,
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl HttpStore {
    /// Creates a client for the store rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidStoreUrl`] if `base_url` is not an absolute http(s) URL.
    /// - [`StoreError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(base_url: &str, options: HttpStoreOptions) -> Result<Self, StoreError> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| StoreError::InvalidStoreUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::InvalidStoreUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }
        if options.poll_interval.is_zero() {
            return Err(StoreError::InvalidStoreUrl {
                url: base_url.to_owned(),
                reason: "poll interval must be greater than zero".to_owned(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(options.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: options.token,
            max_retries: options.max_retries,
            backoff_base_ms: options.backoff_base_ms,
            poll_interval: options.poll_interval,
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/collections/{}/documents",
            self.base_url,
            utf8_percent_encode(collection, PATH_SEGMENT)
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.documents_url(collection),
            utf8_percent_encode(id, PATH_SEGMENT)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetches the listing once (no retry) and returns it with the digest of
    /// the raw response body.
    async fn fetch_listing(
        &self,
        collection: &str,
    ) -> Result<(Vec<RawDocument>, [u8; 32]), StoreError> {
        let url = self.documents_url(collection);
        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = check_status(response, "list", collection, None)?;

        let body = response.bytes().await?;
        let digest: [u8; 32] = Sha256::digest(&body).into();
        let parsed = serde_json::from_slice::<ListResponse>(&body).map_err(|e| {
            StoreError::Deserialize {
                context: format!("document listing of {collection}"),
                source: e,
            }
        })?;
        Ok((parsed.documents, digest))
    }

    /// Poll loop backing a live subscription. Runs until the task is aborted.
    async fn poll_listing(self, collection: String, listener: Arc<dyn SnapshotListener>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_digest: Option<[u8; 32]> = None;
        let mut failing = false;

        loop {
            ticker.tick().await;
            match self.fetch_listing(&collection).await {
                Ok((documents, digest)) => {
                    if failing {
                        tracing::info!(collection = %collection, "document store poll recovered");
                        failing = false;
                    }
                    if last_digest != Some(digest) {
                        last_digest = Some(digest);
                        tracing::debug!(
                            collection = %collection,
                            count = documents.len(),
                            "document listing changed"
                        );
                        listener.on_snapshot(documents);
                    }
                }
                Err(err) => {
                    if failing {
                        tracing::debug!(collection = %collection, error = %err, "document store poll still failing");
                    } else {
                        failing = true;
                        last_digest = None;
                        tracing::warn!(collection = %collection, error = %err, "document store poll failed");
                        listener.on_error(err);
                    }
                }
            }
        }
    }
}

/// Maps non-2xx responses onto typed errors.
fn check_status(
    response: Response,
    operation: &'static str,
    collection: &str,
    id: Option<&str>,
) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1);
            Err(StoreError::RateLimited { retry_after_secs })
        }
        StatusCode::NOT_FOUND => Err(StoreError::NotFound {
            collection: collection.to_owned(),
            id: id.unwrap_or_default().to_owned(),
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::PermissionDenied {
            operation,
            collection: collection.to_owned(),
        }),
        _ => Err(StoreError::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        }),
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            self.fetch_listing(collection)
                .await
                .map(|(documents, _)| documents)
        })
        .await
    }

    fn subscribe(
        &self,
        collection: &str,
        listener: Arc<dyn SnapshotListener>,
    ) -> Result<Subscription, StoreError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            StoreError::Unavailable(format!("live subscription needs a Tokio runtime: {e}"))
        })?;

        let task = runtime.spawn(self.clone().poll_listing(collection.to_owned(), listener));
        tracing::debug!(collection, interval = ?self.poll_interval, "started document store poller");

        let collection = collection.to_owned();
        Ok(Subscription::new(move || {
            task.abort();
            tracing::debug!(collection = %collection, "stopped document store poller");
        }))
    }

    async fn create(&self, collection: &str, fields: Map<String, Value>) -> Result<String, StoreError> {
        // Not retried: a lost response would otherwise create a duplicate.
        let url = self.documents_url(collection);
        let response = self
            .authorize(self.client.post(&url).json(&fields))
            .send()
            .await?;
        let response = check_status(response, "create", collection, None)?;

        let body = response.text().await?;
        let created = serde_json::from_str::<CreateResponse>(&body).map_err(|e| {
            StoreError::Deserialize {
                context: format!("create response for {collection}"),
                source: e,
            }
        })?;
        if created.id.trim().is_empty() {
            return Err(StoreError::InvalidDocument {
                collection: collection.to_owned(),
                reason: "store returned an empty document id".to_owned(),
            });
        }
        Ok(created.id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let url = self.document_url(collection, id);
        let (url, fields) = (&url, &fields);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .authorize(self.client.patch(url).json(fields))
                .send()
                .await?;
            check_status(response, "update", collection, Some(id)).map(|_| ())
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(collection, id);
        let response = self.authorize(self.client.delete(&url)).send().await?;
        check_status(response, "delete", collection, Some(id)).map(|_| ())
    }
}
