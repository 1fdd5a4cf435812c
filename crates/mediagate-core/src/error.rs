//! Error types module
//!
//! All pipeline failures are unified under [`IngestError`]. Validation errors
//! are fatal and carry a user-facing message; every external collaborator
//! (storage, state tracker, scanner, transcoder, probe, rasterizer) has its
//! own variant whose message is surfaced unmodified to the caller.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for content the uploader got wrong
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the invoking platform may retry the event
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("State tracker error: {0}")]
    StateTracker(String),

    #[error("Virus scan error: {0}")]
    Scan(String),

    #[error("Transcode engine error: {0}")]
    Transcode(String),

    #[error("Media probe error: {0}")]
    Probe(String),

    #[error("PDF rasterizer error: {0}")]
    Rasterize(String),

    #[error("Thumbnail error: {0}")]
    Thumbnail(String),

    #[error("Invalid content: {0}")]
    Content(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type IngestResult<T> = Result<T, IngestError>;

impl From<anyhow::Error> for IngestError {
    fn from(err: anyhow::Error) -> Self {
        IngestError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for IngestError {
    fn from(err: io::Error) -> Self {
        IngestError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Internal(format!("JSON error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn ingest_error_static_metadata(err: &IngestError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        IngestError::Validation(_) => (400, "VALIDATION_ERROR", false, LogLevel::Debug),
        IngestError::Storage(_) => (502, "STORAGE_ERROR", true, LogLevel::Error),
        IngestError::StateTracker(_) => (502, "STATE_TRACKER_ERROR", true, LogLevel::Error),
        IngestError::Scan(_) => (502, "SCAN_ERROR", true, LogLevel::Error),
        IngestError::Transcode(_) => (502, "TRANSCODE_ERROR", true, LogLevel::Error),
        IngestError::Probe(_) => (502, "PROBE_ERROR", true, LogLevel::Error),
        IngestError::Rasterize(_) => (502, "RASTERIZE_ERROR", true, LogLevel::Error),
        IngestError::Thumbnail(_) => (422, "THUMBNAIL_ERROR", false, LogLevel::Warn),
        IngestError::Content(_) => (422, "CONTENT_ERROR", false, LogLevel::Warn),
        IngestError::Internal(_) | IngestError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl IngestError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            IngestError::Validation(_) => "Validation",
            IngestError::Storage(_) => "Storage",
            IngestError::StateTracker(_) => "StateTracker",
            IngestError::Scan(_) => "Scan",
            IngestError::Transcode(_) => "Transcode",
            IngestError::Probe(_) => "Probe",
            IngestError::Rasterize(_) => "Rasterize",
            IngestError::Thumbnail(_) => "Thumbnail",
            IngestError::Content(_) => "Content",
            IngestError::Internal(_) | IngestError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Whether the failure came from an external collaborator.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            IngestError::Storage(_)
                | IngestError::StateTracker(_)
                | IngestError::Scan(_)
                | IngestError::Transcode(_)
                | IngestError::Probe(_)
                | IngestError::Rasterize(_)
        )
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for IngestError {
    fn http_status_code(&self) -> u16 {
        ingest_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        ingest_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        ingest_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        ingest_error_static_metadata(self).3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_message_verbatim() {
        let err = IngestError::Validation("Unrecognized key format \"x\"".to_string());
        assert_eq!(err.to_string(), "Unrecognized key format \"x\"");
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(!err.is_external());
    }

    #[test]
    fn external_errors_are_recoverable() {
        for err in [
            IngestError::Storage("timeout".into()),
            IngestError::StateTracker("503".into()),
            IngestError::Scan("connection refused".into()),
            IngestError::Transcode("throttled".into()),
        ] {
            assert!(err.is_external());
            assert!(err.is_recoverable());
            assert_eq!(err.http_status_code(), 502);
        }
    }

    #[test]
    fn anyhow_errors_keep_their_chain() {
        let inner = anyhow::anyhow!("disk full").context("writing temp file");
        let err = IngestError::from(inner);
        assert_eq!(err.error_type(), "Internal");
        assert!(err.detailed_message().contains("disk full"));
    }
}
