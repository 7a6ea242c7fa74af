//! HTTP client for the documents-index endpoint.
//!
//! One request per batch: `POST
//! {endpoint}/indexes/{index}/docs/index?api-version={v}` with the admin key
//! in the `api-key` header and a `{"value": [...]}` body. The service
//! answers 200 when every document was accepted and 207 when some were
//! rejected; both carry a per-document outcome list that is folded into an
//! [`UploadResult`].

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Outcome of one batch upload.
///
/// Partial failure is data, not an error: the service may accept some
/// documents and reject others, and the caller decides what to do with the
/// rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadResult {
    /// Documents the service accepted.
    pub succeeded: usize,
    /// Documents the service rejected.
    pub failed: usize,
    /// Detail for each rejected document, in response order.
    pub failures: Vec<DocumentFailure>,
}

impl UploadResult {
    /// Whether every document in the batch was accepted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// A document the service rejected within an otherwise accepted batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    /// Key of the rejected document.
    pub key: String,
    /// Per-document HTTP-style status code reported by the service.
    pub status_code: u16,
    /// Service-provided error message, if any.
    pub message: String,
}

/// Request body for the documents-index endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct IndexBatch {
    pub(crate) value: Vec<Value>,
}

/// One entry of the service's per-document outcome list.
#[derive(Debug, Deserialize)]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(rename = "statusCode")]
    status_code: u16,
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    value: Vec<IndexingResult>,
}

/// Owned connection to one index's documents endpoint.
///
/// Constructed by `AzureSearchSink::build` and released when the writer is
/// dropped; never process-global.
#[derive(Debug)]
pub(crate) struct SearchClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl SearchClient {
    pub(crate) fn new(
        endpoint: &str,
        index_name: &str,
        api_version: &str,
        api_key: &str,
    ) -> Result<Self> {
        let parsed = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("invalid endpoint `{endpoint}`: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "endpoint `{endpoint}` must use http or https"
            )));
        }
        let url = format!(
            "{}/indexes/{}/docs/index?api-version={}",
            endpoint.trim_end_matches('/'),
            index_name,
            api_version
        );
        Ok(Self {
            http: reqwest::Client::new(),
            url,
            api_key: api_key.to_string(),
        })
    }

    /// Upload one batch, folding the service's per-document outcomes.
    ///
    /// # Errors
    ///
    /// [`Error::Transient`] for transport failures, throttling, and 5xx;
    /// [`Error::Fatal`] for auth and malformed-request responses.
    pub(crate) async fn upload(&self, batch: &IndexBatch) -> Result<UploadResult> {
        debug!(url = %self.url, documents = batch.value.len(), "posting batch");
        let response = self
            .http
            .post(&self.url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(batch)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let parsed: IndexResponse = response.json().await.map_err(|e| {
            Error::fatal(format!("could not parse indexing response: {e}"))
        })?;
        Ok(fold_outcomes(parsed))
    }
}

fn fold_outcomes(response: IndexResponse) -> UploadResult {
    let mut result = UploadResult::default();
    for outcome in response.value {
        if outcome.status {
            result.succeeded += 1;
        } else {
            result.failed += 1;
            result.failures.push(DocumentFailure {
                key: outcome.key,
                status_code: outcome.status_code,
                message: outcome.error_message.unwrap_or_default(),
            });
        }
    }
    if result.failed > 0 {
        warn!(
            succeeded = result.succeeded,
            failed = result.failed,
            "index rejected some documents"
        );
    }
    result
}

/// Classify a transport-level failure. Everything that never reached the
/// service (or timed out waiting for it) is retryable.
fn classify_request_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::transient(format!("request timed out: {err}"))
    } else if err.is_connect() {
        Error::transient(format!("connection failed: {err}"))
    } else {
        Error::transient(format!("request failed: {err}"))
    }
}

/// Classify a non-2xx response status.
fn classify_status(status: StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::fatal(format!("authentication rejected ({status}): {body}")),
        408 => Error::transient(format!("service timed out ({status}): {body}")),
        429 => Error::transient(format!("throttled ({status}): {body}")),
        500..=599 => Error::transient(format!("service error ({status}): {body}")),
        _ => Error::fatal(format!("request rejected ({status}): {body}")),
    }
}
