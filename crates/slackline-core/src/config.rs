//! Client configuration.
//!
//! A [`ClientConfig`] is built once per top-level client and shared,
//! read-only, by every resource group. The tokio runtime handle that calls
//! are spawned on is a required constructor argument; slackline never looks
//! for an ambient runtime by itself.
//!
//! ```ignore
//! use std::time::Duration;
//! use slackline_core::ClientConfig;
//!
//! let config = ClientConfig::builder(tokio::runtime::Handle::current())
//!     .token("xoxb-...")
//!     .timeout(Duration::from_secs(30))
//!     .build()?;
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokio::runtime::Handle;

use crate::error::{Error, Result};
use crate::logging::targets;

/// Base URL template. `{api}` is replaced by the API method name.
pub const DEFAULT_BASE_URL: &str = "https://slack.com/api/{api}";

/// Placeholder substituted by the method path.
pub const API_PLACEHOLDER: &str = "{api}";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable configuration shared by all resource groups of a client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    token: Option<String>,
    timeout: Option<Duration>,
    base_url: String,
    incoming_webhook_url: Option<String>,
    user_agent: String,
    runtime: Handle,
}

impl ClientConfig {
    /// Create a builder that spawns calls on the given runtime.
    pub fn builder(runtime: Handle) -> ClientConfigBuilder {
        ClientConfigBuilder::new(runtime)
    }

    /// Build a configuration from loaded settings.
    pub fn from_settings(settings: ClientSettings, runtime: Handle) -> Result<Self> {
        let mut builder = Self::builder(runtime);
        if let Some(token) = settings.token {
            builder = builder.token(token);
        }
        builder = match settings.timeout_ms {
            Some(0) => builder.no_timeout(),
            Some(ms) => builder.timeout(Duration::from_millis(ms)),
            None => builder,
        };
        if let Some(base_url) = settings.base_url {
            builder = builder.base_url(base_url);
        }
        if let Some(url) = settings.incoming_webhook_url {
            builder = builder.incoming_webhook_url(url);
        }
        if let Some(user_agent) = settings.user_agent {
            builder = builder.user_agent(user_agent);
        }
        builder.build()
    }

    /// The auth token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The request timeout. `None` means calls never time out.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The base URL template.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The incoming-webhook URL, if any.
    pub fn incoming_webhook_url(&self) -> Option<&str> {
        self.incoming_webhook_url.as_deref()
    }

    /// The user agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The runtime calls are spawned on.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Resolve an API method name against the base URL template.
    pub fn resolve(&self, api: &str) -> Result<url::Url> {
        let resolved = self.base_url.replace(API_PLACEHOLDER, api);
        Ok(url::Url::parse(&resolved)?)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    token: Option<String>,
    timeout: Option<Duration>,
    base_url: String,
    incoming_webhook_url: Option<String>,
    user_agent: String,
    runtime: Handle,
}

impl ClientConfigBuilder {
    fn new(runtime: Handle) -> Self {
        Self {
            token: None,
            timeout: Some(DEFAULT_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            incoming_webhook_url: None,
            user_agent: format!("slackline/{} (Rust)", env!("CARGO_PKG_VERSION")),
            runtime,
        }
    }

    /// Set the auth token sent as the `token` query parameter.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the base URL template. It must contain `{api}`.
    pub fn base_url(mut self, template: impl Into<String>) -> Self {
        self.base_url = template.into();
        self
    }

    /// Set the incoming-webhook URL.
    pub fn incoming_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.incoming_webhook_url = Some(url.into());
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        if !self.base_url.contains(API_PLACEHOLDER) {
            return Err(Error::Config(format!(
                "base URL template '{}' has no {API_PLACEHOLDER} placeholder",
                self.base_url
            )));
        }
        url::Url::parse(&self.base_url.replace(API_PLACEHOLDER, "api.test"))?;
        if let Some(ref url) = self.incoming_webhook_url {
            url::Url::parse(url)?;
        }

        tracing::debug!(
            target: targets::CONFIG,
            has_token = self.token.is_some(),
            timeout = ?self.timeout,
            base_url = %self.base_url,
            "client configuration built"
        );

        Ok(ClientConfig {
            token: self.token,
            timeout: self.timeout,
            base_url: self.base_url,
            incoming_webhook_url: self.incoming_webhook_url,
            user_agent: self.user_agent,
            runtime: self.runtime,
        })
    }
}

/// Serializable settings, e.g. loaded from a TOML file.
///
/// ```toml
/// token = "xoxb-..."
/// timeout_ms = 10000          # 0 disables the timeout
/// base_url = "https://slack.com/api/{api}"
/// incoming_webhook_url = "https://hooks.slack.com/services/..."
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    /// Auth token.
    pub token: Option<String>,
    /// Request timeout in milliseconds; `0` disables it.
    pub timeout_ms: Option<u64>,
    /// Base URL template.
    pub base_url: Option<String>,
    /// Incoming-webhook URL.
    pub incoming_webhook_url: Option<String>,
    /// User agent override.
    pub user_agent: Option<String>,
}

impl ClientSettings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
