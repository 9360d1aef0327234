//! Session and backend errors.

/// Failure talking to the summarization backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        /// Backend operation that failed.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Anything else.
    #[error("{message}")]
    Other {
        /// Description.
        message: String,
    },
}

impl BackendError {
    /// Short category string for structured logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(e) if e.is_timeout() => "timeout",
            Self::Http(e) if e.is_connect() => "connect",
            Self::Http(_) => "network",
            Self::Status { .. } => "status",
            Self::Other { .. } => "unknown",
        }
    }

    /// HTTP status code, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Other { .. } => None,
        }
    }
}

/// Errors from [`Session`](crate::Session) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Summarization requested with no document uploaded.
    #[error("no document uploaded")]
    NoDocument,

    /// Rejected before upload: extension not in the allowed list.
    #[error("unsupported document {name:?}: allowed extensions are {allowed}")]
    UnsupportedDocument {
        /// File name as given.
        name: String,
        /// Comma-separated allowed extensions.
        allowed: String,
    },

    /// Rejected before upload: larger than the configured limit.
    #[error("document {name:?} is {size} bytes, limit is {limit}")]
    DocumentTooLarge {
        /// File name as given.
        name: String,
        /// Document size in bytes.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// Export requested while the download control is disabled.
    #[error("no summary available for download")]
    DownloadUnavailable,

    /// The backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for session results.
pub type Result<T> = std::result::Result<T, SessionError>;
