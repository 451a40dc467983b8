//! Tracing integration for slackline.
//!
//! slackline uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("slackline_net=debug")
//!     .init();
//! ```
//!
//! The auth token is never written to any log record.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Configuration and settings loading.
    pub const CONFIG: &str = "slackline_core::config";
    /// HTTP call executor.
    pub const EXECUTOR: &str = "slackline_net::executor";
    /// In-flight operation registry.
    pub const REGISTRY: &str = "slackline_net::registry";
    /// Multipart payload builder.
    pub const MULTIPART: &str = "slackline_net::multipart";
    /// Incoming webhook poster.
    pub const WEBHOOK: &str = "slackline_net::webhook";
    /// Top-level client and resource-group aggregation.
    pub const CLIENT: &str = "slackline::client";
}

/// Redact a URL's query string for logging.
///
/// The query carries the auth token, so only scheme, host and path are kept.
pub fn redact_url(url: &url::Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
