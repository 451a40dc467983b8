//! Core types for slackline.
//!
//! This crate holds the pieces of the client that do no I/O:
//!
//! - [`ClientConfig`]: immutable per-client configuration, including the
//!   runtime handle calls are spawned on
//! - [`Envelope`]: the decoded `{"ok": ..., "error": ...}` response body
//! - [`Params`] and [`ApiCall`]: call parameters and their doseq URL encoding
//! - [`Error`]: the single error type every call fails with
//!
//! The networking side lives in `slackline-net`.

pub mod call;
pub mod config;
pub mod envelope;
mod error;
pub mod logging;
pub mod operation;
pub mod params;

pub use call::{ApiCall, HttpMethod};
pub use config::{ClientConfig, ClientConfigBuilder, ClientSettings};
pub use envelope::Envelope;
pub use error::{Error, ErrorKind, OperationFailure, Result};
pub use operation::{OperationId, Outcome};
pub use params::{FileSource, ParamValue, Params};
