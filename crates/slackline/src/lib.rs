//! slackline - an async Slack Web API client.
//!
//! Every call is spawned on the tokio runtime given in the configuration and
//! tracked until it finishes, so a client can be shut down without
//! abandoning work in flight.
//!
//! # Example
//!
//! ```no_run
//! use slackline::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> slackline::Result<()> {
//!     let config = ClientConfig::builder(tokio::runtime::Handle::current())
//!         .token("xoxb-...")
//!         .build()?;
//!
//!     SlackClient::scope(config, |slack| async move {
//!         let reply = slack.chat.post_message("#general", "hello").await?;
//!         println!("posted at {:?}", reply.get("ts"));
//!         Ok(())
//!     })
//!     .await
//! }
//! ```

pub mod client;
pub mod groups;
pub mod prelude;

pub use client::SlackClient;
pub use groups::{Endpoints, UploadOptions};
pub use slackline_core::{
    ApiCall, ClientConfig, ClientConfigBuilder, ClientSettings, Envelope, Error, ErrorKind,
    FileSource, HttpMethod, OperationFailure, OperationId, ParamValue, Params, Result,
};
pub use slackline_net::{InFlight, IncomingWebhook, ResourceGroup};

/// Logging targets and helpers.
pub mod logging {
    pub use slackline_core::logging::*;
}
