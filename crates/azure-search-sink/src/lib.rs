//! Batched Azure AI Search upload sink for streaming dataflows.
//!
//! This crate adapts a per-record push interface (one call per incoming
//! record) to the per-batch documents-upload API of an Azure AI Search
//! index. Records are validated against a user-declared field schema,
//! accumulated into size-bounded batches, and uploaded in one request per
//! batch; documents the service rejects inside an otherwise accepted batch
//! are reported back per record instead of failing the stream.
//!
//! # Features
//!
//! - Schema-driven validation with default filling and a closed set of
//!   field kinds (string, string collection, number collection / vector)
//! - Strictly size-bounded batching with flush-on-close
//! - Partial failure surfaced as data ([`UploadResult`]), full-batch
//!   failure classified retryable vs. not ([`Error::is_retryable`])
//! - Explicit client ownership: the network client lives inside the writer,
//!   acquired at build time and released with it
//!
//! # Example
//!
//! ```rust,no_run
//! use azure_search_sink::{AzureSearchSink, FieldKind, IndexSchema, Record};
//! use serde_json::json;
//!
//! # async fn example() -> azure_search_sink::Result<()> {
//! let schema = IndexSchema::builder()
//!     .field("id", FieldKind::String)
//!     .field_with_default("content", FieldKind::String, json!(""))
//!     .vector_field("vector", 1536)
//!     .build()?;
//!
//! let sink = AzureSearchSink::new(
//!     "my-service",
//!     "my-index",
//!     "2024-07-01",
//!     AzureSearchSink::admin_key_from_env()?,
//!     schema,
//! )?
//! .with_batch_size(50);
//!
//! let mut writer = sink.build()?;
//! let mut record = Record::new();
//! record.insert("id".into(), json!("doc-1"));
//! record.insert("content".into(), json!("hello world"));
//! record.insert("vector".into(), json!(vec![0.0f32; 1536]));
//!
//! writer.write(&record).await?;
//! // ... more writes; a batch uploads each time the limit is reached ...
//! writer.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Batching policy
//!
//! Batching is strictly size-bounded - there is no time-based flush. Under
//! low throughput records stay buffered until [`AzureSearchWriter::close`],
//! so the hosting dataflow must call `close()` on every exit path,
//! including failure paths.
//!
//! # Error handling
//!
//! The sink never retries internally and never swallows a failure: every
//! error is raised ([`Error`]) or reported in the returned [`UploadResult`].
//! Retry and escalation policy belong to the host; [`Error::is_retryable`]
//! says whether re-driving `flush()` with the retained buffer is safe.
//!
//! # Authentication
//!
//! Requests carry the index admin key in the `api-key` header. Pass the key
//! explicitly or read it from the environment:
//!
//! ```bash
//! export AZURE_SEARCH_ADMIN_KEY="your-admin-key"
//! ```

/// Service API version the examples and tests are written against.
pub const STABLE_API_VERSION: &str = "2024-07-01";

mod client;
mod document;
mod error;
mod schema;
mod sink;

pub use client::{DocumentFailure, UploadResult};
pub use document::{Record, SearchAction};
pub use error::{Error, Result};
pub use schema::{FieldKind, FieldSpec, IndexSchema, SchemaBuilder, SchemaField};
pub use sink::{
    AzureSearchSink, AzureSearchWriter, ADMIN_KEY_ENV, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE,
};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== Constants ====================

    #[test]
    fn test_stable_api_version_constant() {
        assert_eq!(STABLE_API_VERSION, "2024-07-01");
    }

    #[test]
    fn test_admin_key_env_constant() {
        assert_eq!(ADMIN_KEY_ENV, "AZURE_SEARCH_ADMIN_KEY");
    }

    #[test]
    fn test_batch_size_constants() {
        assert!(DEFAULT_BATCH_SIZE > 0);
        assert!(DEFAULT_BATCH_SIZE <= MAX_BATCH_SIZE);
        assert_eq!(MAX_BATCH_SIZE, 1000);
    }

    // ==================== Public re-exports ====================

    #[test]
    fn test_schema_builder_reexport() {
        let schema = IndexSchema::builder()
            .field("id", FieldKind::String)
            .build()
            .unwrap();
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_sink_reexport() {
        let schema = IndexSchema::builder()
            .field("id", FieldKind::String)
            .build()
            .unwrap();
        let sink =
            AzureSearchSink::new("svc", "idx", STABLE_API_VERSION, "key", schema).unwrap();
        let _writer: AzureSearchWriter = sink.build().unwrap();
    }

    #[test]
    fn test_upload_result_reexport() {
        let result = UploadResult::default();
        assert!(result.is_complete());
    }
}
