//! Error types for slackline.
//!
//! Every failure a call can end with is surfaced as a single [`Error`] type.
//! Use [`Error::kind`] to branch on the category without matching payloads.

use std::fmt;
use std::time::Duration;

use crate::operation::OperationId;

/// A specialized Result type for slackline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The client was used in a way its configuration does not allow.
    Config,
    /// Connecting to or talking with the server failed.
    Transport,
    /// The configured timeout elapsed.
    Timeout,
    /// The server answered with a non-2xx status.
    HttpStatus,
    /// The response envelope reported `ok: false`.
    Api,
    /// A local file could not be read.
    Io,
    /// A body could not be encoded or decoded as JSON.
    Json,
    /// The operation was aborted before it finished.
    Cancelled,
    /// The resource group was already closed.
    Closed,
    /// One or more operations awaited by a drain failed.
    Drain,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::HttpStatus => "http_status",
            Self::Api => "api",
            Self::Io => "io",
            Self::Json => "json",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
            Self::Drain => "drain",
        };
        f.write_str(name)
    }
}

/// A failed operation reported by a drain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationFailure {
    /// The operation that failed.
    pub id: OperationId,
    /// The kind of error it ended with.
    pub kind: ErrorKind,
    /// The error message.
    pub message: String,
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.id, self.kind, self.message)
    }
}

/// Errors that can occur while issuing or draining API calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, e.g. posting to a webhook with no URL.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection refused, DNS failure, broken stream, etc.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP error status. The body is not inspected.
    #[error("HTTP {status}: {reason}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The canonical reason phrase.
        reason: String,
    },

    /// The server reported `ok: false`; carries the server's error string.
    #[error("API error: {0}")]
    Api(String),

    /// I/O error while reading a file attachment.
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// The operation was aborted.
    #[error("Operation was cancelled")]
    Cancelled,

    /// A call was dispatched on a resource group after it was closed.
    #[error("Resource group '{0}' is closed")]
    Closed(String),

    /// Operations awaited by a drain failed.
    #[error("{} drained operation(s) failed", .failures.len())]
    Drain {
        /// Every failure observed by the drain, in completion order.
        failures: Vec<OperationFailure>,
    },
}

impl Error {
    /// Get the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::Api(_) => ErrorKind::Api,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Closed(_) => ErrorKind::Closed,
            Self::Drain { .. } => ErrorKind::Drain,
        }
    }

    /// The HTTP status code, for [`Error::HttpStatus`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server-supplied error string, for [`Error::Api`].
    pub fn api_error(&self) -> Option<&str> {
        match self {
            Self::Api(message) => Some(message),
            _ => None,
        }
    }

    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid settings: {err}"))
    }
}
