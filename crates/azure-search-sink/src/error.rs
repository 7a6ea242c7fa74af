//! Error types for sink operations.
//!
//! The sink never retries on its own. Every failure is either raised as one
//! of the variants below or, for documents the service rejected inside an
//! otherwise accepted batch, reported in the returned
//! [`UploadResult`](crate::UploadResult). Use [`Error::is_retryable`] to
//! decide whether re-driving `flush()` with the retained buffer is safe.

use thiserror::Error;

/// Result type alias for sink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by sink construction, record validation, and batch upload.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid schema or construction parameter.
    ///
    /// Raised at construction time. Not retryable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A record failed schema validation.
    ///
    /// The offending `write` call fails immediately and the buffer is left
    /// exactly as it was. Not retryable with the same record.
    #[error("validation error: {0}")]
    Validation(String),

    /// Network or service failure that is safe to retry as a whole batch
    /// (timeout, connection failure, throttling, 5xx).
    ///
    /// The batch stays buffered; the host owns the backoff policy.
    #[error("transient service error: {0}")]
    Transient(String),

    /// Authentication or malformed-request failure. Must not be retried
    /// blindly.
    #[error("fatal service error: {0}")]
    Fatal(String),

    /// Request or response body (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a transient (retryable) service error.
    pub fn transient(msg: impl Into<String>) -> Self {
        Error::Transient(msg.into())
    }

    /// Create a fatal (non-retryable) service error.
    pub fn fatal(msg: impl Into<String>) -> Self {
        Error::Fatal(msg.into())
    }

    /// Whether retrying the failed operation with the same input is safe.
    ///
    /// True only for [`Error::Transient`]; everything else needs the caller
    /// to change something first.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_))
    }

    /// Whether this error came from record validation.
    ///
    /// Hosts that prefer to drop bad records and keep the stream going can
    /// branch on this instead of failing the step.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== Display formatting ====================

    #[test]
    fn test_configuration_display() {
        let err = Error::config("schema is empty");
        assert_eq!(err.to_string(), "configuration error: schema is empty");
    }

    #[test]
    fn test_validation_display() {
        let err = Error::validation("missing field `id`");
        assert_eq!(err.to_string(), "validation error: missing field `id`");
    }

    #[test]
    fn test_transient_display() {
        let err = Error::transient("throttled (429)");
        assert_eq!(err.to_string(), "transient service error: throttled (429)");
    }

    #[test]
    fn test_fatal_display() {
        let err = Error::fatal("authentication rejected (403)");
        assert_eq!(
            err.to_string(),
            "fatal service error: authentication rejected (403)"
        );
    }

    // ==================== Classification predicates ====================

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(Error::transient("x").is_retryable());
        assert!(!Error::config("x").is_retryable());
        assert!(!Error::validation("x").is_retryable());
        assert!(!Error::fatal("x").is_retryable());
    }

    #[test]
    fn test_is_validation() {
        assert!(Error::validation("x").is_validation());
        assert!(!Error::transient("x").is_validation());
        assert!(!Error::fatal("x").is_validation());
    }

    // ==================== Conversions ====================

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(!err.is_retryable());
    }
}
