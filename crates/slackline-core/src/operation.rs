//! Identity and outcome of an in-flight operation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, ErrorKind, OperationFailure};

/// Unique identifier for a dispatched operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    /// Allocate the next process-wide operation ID.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw value. Used for reporting and tests.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// How an operation finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The call produced a value.
    Succeeded,
    /// The call produced an error.
    Failed {
        /// Category of the error.
        kind: ErrorKind,
        /// The error message.
        message: String,
    },
    /// The call was aborted or its task went away before producing a result.
    Cancelled,
}

impl Outcome {
    /// Derive the outcome recorded for a finished call.
    pub fn of<T>(result: &Result<T, Error>) -> Self {
        match result {
            Ok(_) => Self::Succeeded,
            Err(Error::Cancelled) => Self::Cancelled,
            Err(err) => Self::Failed {
                kind: err.kind(),
                message: err.to_string(),
            },
        }
    }

    /// Convert a failed outcome into a drain failure entry.
    pub fn into_failure(self, id: OperationId) -> Option<OperationFailure> {
        match self {
            Self::Failed { kind, message } => Some(OperationFailure { id, kind, message }),
            Self::Succeeded | Self::Cancelled => None,
        }
    }
}
