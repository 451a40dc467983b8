//! Mapping of transport errors onto [`slackline_core::Error`].

use std::time::Duration;

use slackline_core::Error;

/// Classify a reqwest error.
///
/// `timeout` is the configured per-call limit, reported back in
/// [`Error::Timeout`] when reqwest itself gave up on time. Without a
/// configured limit the reported duration is zero.
pub fn from_reqwest(err: reqwest::Error, timeout: Option<Duration>) -> Error {
    if err.is_timeout() {
        Error::Timeout(timeout.unwrap_or(Duration::ZERO))
    } else if err.is_connect() {
        Error::Transport(format!("connection failed: {}", without_url(err)))
    } else if err.is_body() || err.is_decode() {
        Error::Transport(format!("reading response body: {}", without_url(err)))
    } else {
        Error::Transport(without_url(err).to_string())
    }
}

// reqwest includes the full URL, token and all, in its Display output.
fn without_url(err: reqwest::Error) -> reqwest::Error {
    err.without_url()
}
