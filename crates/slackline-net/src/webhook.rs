//! Incoming-webhook poster.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use slackline_core::logging::{redact_url, targets};
use slackline_core::{ClientConfig, Error, Result};

use crate::executor::exchange;
use crate::pool::ConnectionPool;
use crate::registry::{InFlight, OperationRegistry};

const NAME: &str = "incoming_webhook";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Posts payloads to the configured incoming-webhook URL.
///
/// No token is sent. The response body is parsed directly as JSON, without
/// the `ok`/`error` envelope check.
pub struct IncomingWebhook {
    config: Arc<ClientConfig>,
    pool: ConnectionPool,
    registry: OperationRegistry,
}

impl IncomingWebhook {
    /// Create the poster with its own pool and registry.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        let pool = ConnectionPool::open(NAME, &config)?;
        let registry = OperationRegistry::new(NAME, config.runtime().clone());
        Ok(Self {
            config,
            pool,
            registry,
        })
    }

    /// The registry tracking posts in flight.
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Post `body` verbatim, with no content type of its own.
    ///
    /// Without a configured URL the handle resolves to
    /// [`Error::Config`] at once; no request is made and nothing is
    /// registered.
    pub fn post(&self, body: impl Into<Bytes>) -> InFlight<Value> {
        self.send(body.into(), None)
    }

    /// Serialize `payload` as JSON and post it as `application/json`.
    pub fn post_json<T: Serialize + ?Sized>(&self, payload: &T) -> InFlight<Value> {
        match serde_json::to_vec(payload) {
            Ok(body) => self.send(body.into(), Some(JSON_CONTENT_TYPE)),
            Err(err) => InFlight::rejected(err.into()),
        }
    }

    fn send(&self, body: Bytes, content_type: Option<&'static str>) -> InFlight<Value> {
        let Some(url) = self.config.incoming_webhook_url() else {
            tracing::warn!(target: targets::WEBHOOK, "post without an incoming webhook URL");
            return InFlight::rejected(Error::Config(
                "no incoming webhook URL configured".to_string(),
            ));
        };
        let url = match url::Url::parse(url) {
            Ok(url) => url,
            Err(err) => return InFlight::rejected(err.into()),
        };
        let client = match self.pool.acquire() {
            Ok(client) => client,
            Err(err) => return InFlight::rejected(err),
        };

        let timeout = self.config.timeout();
        tracing::debug!(
            target: targets::WEBHOOK,
            url = %redact_url(&url),
            size = body.len(),
            "posting to incoming webhook"
        );

        self.registry.dispatch(async move {
            let mut request = client.post(url).body(body);
            if let Some(content_type) = content_type {
                request = request.header(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            let text = exchange(request, timeout).await?;
            Ok(serde_json::from_str(&text)?)
        })
    }

    /// Drain posts in flight and release the pool. Idempotent.
    pub async fn close(&self) -> Result<()> {
        let drained = self.registry.drain().await;
        self.pool.release();
        drained
    }

    /// Check if the webhook has been closed.
    pub fn is_closed(&self) -> bool {
        self.pool.is_released()
    }
}

impl std::fmt::Debug for IncomingWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingWebhook")
            .field("configured", &self.config.incoming_webhook_url().is_some())
            .field("outstanding", &self.registry.len())
            .finish()
    }
}
