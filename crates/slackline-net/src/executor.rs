//! Execution of a single API call.
//!
//! [`Executor::execute`] turns an [`ApiCall`] into exactly one HTTP request
//! and its response into an [`Envelope`]. The configured timeout covers the
//! whole call: reading upload files, sending, waiting for headers and
//! reading the full body. When it expires the in-flight request future is dropped, which closes the
//! connection instead of returning it to the pool.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use slackline_core::logging::{redact_url, targets};
use slackline_core::{ApiCall, ClientConfig, Envelope, Error, HttpMethod, Params, Result};

use crate::error::from_reqwest;
use crate::multipart::MultipartBody;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Runs API calls against the configured base URL.
#[derive(Clone, Debug)]
pub struct Executor {
    config: Arc<ClientConfig>,
}

impl Executor {
    /// Create an executor for the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }

    /// The configuration this executor uses.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the full request URL of a call, query string included.
    ///
    /// The query holds the call's `params`, then the `token` when one is
    /// configured. A GET call also carries its `data` in the query.
    pub fn request_url(&self, call: &ApiCall) -> Result<url::Url> {
        let mut url = self.config.resolve(&call.path)?;

        let mut query = call.params.clone();
        if let Some(token) = self.config.token() {
            query.insert("token", token);
        }
        if call.method == HttpMethod::Get {
            query.extend(call.data.clone());
        }

        let encoded = query.encode();
        if !encoded.is_empty() {
            let combined = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            };
            url.set_query(Some(&combined));
        }
        Ok(url)
    }

    /// Send the call and decode its response.
    ///
    /// Fails with [`Error::HttpStatus`] on a non-2xx status without looking
    /// at the body, and with [`Error::Api`] when the envelope is not `ok`.
    pub async fn execute(&self, client: &reqwest::Client, call: ApiCall) -> Result<Envelope> {
        let url = self.request_url(&call)?;
        let shown = redact_url(&url);

        let timeout = self.config.timeout();
        let prepared = async {
            let request = match call.method {
                HttpMethod::Get => client.get(url),
                HttpMethod::Post if call.is_multipart() => {
                    let body = MultipartBody::build(&call.files, &call.data).await?;
                    client.post(url).multipart(body.into_form())
                }
                HttpMethod::Post => form_request(client.post(url), &call.data),
            };

            tracing::debug!(
                target: targets::EXECUTOR,
                method = %call.method,
                url = %shown,
                multipart = call.is_multipart(),
                "sending API call"
            );
            round_trip(request, timeout).await
        };

        let text = match within(timeout, prepared).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(
                    target: targets::EXECUTOR,
                    method = %call.method,
                    url = %shown,
                    error = %err,
                    "API call failed"
                );
                return Err(err);
            }
        };

        let envelope = Envelope::parse(text);
        if let Some(message) = envelope.error() {
            tracing::debug!(
                target: targets::EXECUTOR,
                url = %shown,
                error = %message,
                "API reported an error"
            );
        }
        envelope.into_result()
    }
}

fn form_request(request: reqwest::RequestBuilder, data: &Params) -> reqwest::RequestBuilder {
    request
        .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
        .body(data.encode())
}

/// Send a request and read its body as text, within `timeout`.
pub(crate) async fn exchange(
    request: reqwest::RequestBuilder,
    timeout: Option<Duration>,
) -> Result<String> {
    within(timeout, round_trip(request, timeout)).await
}

/// Send a request and read its body as text.
///
/// The response is consumed by the body read or dropped on any early
/// return, so its connection is always released.
async fn round_trip(request: reqwest::RequestBuilder, timeout: Option<Duration>) -> Result<String> {
    let response = request.send().await.map_err(|e| from_reqwest(e, timeout))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }
    response.text().await.map_err(|e| from_reqwest(e, timeout))
}

async fn within<T>(
    timeout: Option<Duration>,
    work: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => work.await,
    }
}
