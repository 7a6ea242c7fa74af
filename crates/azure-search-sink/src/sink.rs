//! The batch upload sink: configuration object plus per-worker writer.

use std::fmt;

use tracing::{info, warn};

use crate::client::{IndexBatch, SearchClient, UploadResult};
use crate::document::{document_body, validate_record, Record, SearchAction};
use crate::error::{Error, Result};
use crate::schema::IndexSchema;

/// Default number of records accumulated before a flush.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Upper bound on the batch size; the documents-index endpoint accepts at
/// most this many documents per request.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Environment variable read by [`AzureSearchSink::admin_key_from_env`].
pub const ADMIN_KEY_ENV: &str = "AZURE_SEARCH_ADMIN_KEY";

/// Sink configuration for one Azure AI Search index.
///
/// Cheap to clone; the hosting dataflow typically holds one of these and
/// calls [`build`](Self::build) once per worker to obtain the writer that
/// does the actual work.
///
/// # Example
///
/// ```no_run
/// use azure_search_sink::{AzureSearchSink, FieldKind, IndexSchema};
/// use serde_json::json;
///
/// # fn example() -> azure_search_sink::Result<()> {
/// let schema = IndexSchema::builder()
///     .field("id", FieldKind::String)
///     .field_with_default("content", FieldKind::String, json!(""))
///     .vector_field("vector", 1536)
///     .build()?;
///
/// let sink = AzureSearchSink::new(
///     "my-service",
///     "my-index",
///     "2024-07-01",
///     AzureSearchSink::admin_key_from_env()?,
///     schema,
/// )?
/// .with_batch_size(50);
///
/// let writer = sink.build()?;
/// # let _ = writer;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AzureSearchSink {
    service_name: String,
    index_name: String,
    api_version: String,
    admin_key: String,
    schema: IndexSchema,
    endpoint: Option<String>,
    batch_size: usize,
    action: SearchAction,
}

impl fmt::Debug for AzureSearchSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureSearchSink")
            .field("service_name", &self.service_name)
            .field("index_name", &self.index_name)
            .field("api_version", &self.api_version)
            .field("batch_size", &self.batch_size)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl AzureSearchSink {
    /// Create a sink configuration.
    ///
    /// # Arguments
    ///
    /// * `service_name` - Azure AI Search service name (the `{service}` in
    ///   `https://{service}.search.windows.net`)
    /// * `index_name` - Target index; must already exist with fields matching
    ///   the schema
    /// * `api_version` - Service API version string, e.g. `"2024-07-01"`
    /// * `admin_key` - Admin key sent as the `api-key` header
    /// * `schema` - Field schema records are validated against
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if any of the string parameters is
    /// empty. (An invalid schema cannot be constructed in the first place.)
    pub fn new(
        service_name: impl Into<String>,
        index_name: impl Into<String>,
        api_version: impl Into<String>,
        admin_key: impl Into<String>,
        schema: IndexSchema,
    ) -> Result<Self> {
        let service_name = service_name.into();
        let index_name = index_name.into();
        let api_version = api_version.into();
        let admin_key = admin_key.into();
        for (value, what) in [
            (&service_name, "service name"),
            (&index_name, "index name"),
            (&api_version, "API version"),
            (&admin_key, "admin key"),
        ] {
            if value.is_empty() {
                return Err(Error::config(format!("{what} must not be empty")));
            }
        }
        Ok(Self {
            service_name,
            index_name,
            api_version,
            admin_key,
            schema,
            endpoint: None,
            batch_size: DEFAULT_BATCH_SIZE,
            action: SearchAction::default(),
        })
    }

    /// Read the admin key from `AZURE_SEARCH_ADMIN_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the variable is not set.
    pub fn admin_key_from_env() -> Result<String> {
        std::env::var(ADMIN_KEY_ENV)
            .map_err(|_| Error::config(format!("{ADMIN_KEY_ENV} not set")))
    }

    /// Set how many records accumulate before a flush. Clamped to
    /// `1..=`[`MAX_BATCH_SIZE`].
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Override the service endpoint. Defaults to
    /// `https://{service}.search.windows.net`; useful for sovereign-cloud
    /// domains and test servers. Validated when the writer is built.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the per-document action tag (default: upload).
    #[must_use]
    pub fn with_action(mut self, action: SearchAction) -> Self {
        self.action = action;
        self
    }

    /// Effective service endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!("https://{}.search.windows.net", self.service_name)
        })
    }

    /// Build the writer for one worker. Acquires the network client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the endpoint override is not a
    /// valid http(s) URL.
    pub fn build(&self) -> Result<AzureSearchWriter> {
        let client = SearchClient::new(
            &self.endpoint(),
            &self.index_name,
            &self.api_version,
            &self.admin_key,
        )?;
        Ok(AzureSearchWriter {
            index_name: self.index_name.clone(),
            schema: self.schema.clone(),
            client,
            action: self.action,
            batch_size: self.batch_size,
            buffer: Vec::new(),
        })
    }
}

/// Per-worker writer: validates records, accumulates them into size-bounded
/// batches, and uploads each batch in one request.
///
/// Owned by a single worker; the host must not share one writer across
/// concurrent writers without external synchronization. Records accumulate
/// until the batch limit is hit or the stream closes - there is no
/// time-based flush, so the host must call [`close`](Self::close) on every
/// exit path or trailing records stay buffered.
#[derive(Debug)]
pub struct AzureSearchWriter {
    index_name: String,
    schema: IndexSchema,
    client: SearchClient,
    action: SearchAction,
    batch_size: usize,
    buffer: Vec<Record>,
}

impl AzureSearchWriter {
    /// Validate and buffer one record, flushing if the batch limit is
    /// reached.
    ///
    /// Returns `Ok(None)` when the record was only buffered and
    /// `Ok(Some(result))` when this write triggered a flush.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the record does not conform to the schema
    /// (the buffer is left untouched), or a flush error as described on
    /// [`flush`](Self::flush).
    pub async fn write(&mut self, record: &Record) -> Result<Option<UploadResult>> {
        let normalized = validate_record(&self.schema, record)?;
        self.buffer.push(normalized);
        if self.buffer.len() >= self.batch_size {
            return self.flush().await;
        }
        Ok(None)
    }

    /// Upload the buffered records as one batch.
    ///
    /// An empty buffer issues no network call and returns `Ok(None)`. On
    /// success the buffer is cleared and the per-document outcome is
    /// returned; documents the service rejected are reported there, never
    /// raised.
    ///
    /// # Errors
    ///
    /// [`Error::Transient`] or [`Error::Fatal`] for a full-batch failure.
    /// The buffer is retained so a retryable failure can be re-driven by
    /// calling `flush` again.
    pub async fn flush(&mut self) -> Result<Option<UploadResult>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let batch = IndexBatch {
            value: self
                .buffer
                .iter()
                .map(|record| document_body(record, self.action))
                .collect(),
        };
        let result = self.client.upload(&batch).await?;
        self.buffer.clear();
        info!(
            index = %self.index_name,
            succeeded = result.succeeded,
            failed = result.failed,
            "batch uploaded"
        );
        Ok(Some(result))
    }

    /// Flush any remaining records and release the network client.
    ///
    /// # Errors
    ///
    /// Propagates the final flush error; the writer is consumed either way.
    pub async fn close(mut self) -> Result<Option<UploadResult>> {
        self.flush().await
    }

    /// Number of records currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl Drop for AzureSearchWriter {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            warn!(
                count = self.buffer.len(),
                index = %self.index_name,
                "writer dropped with buffered records; close() flushes them"
            );
        }
    }
}
