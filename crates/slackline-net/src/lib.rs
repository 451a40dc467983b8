//! Networking engine for slackline.
//!
//! - [`ResourceGroup`]: dispatches calls for one slice of the API over its
//!   own connection pool and tracks them in an [`OperationRegistry`]
//! - [`Executor`]: turns one [`slackline_core::ApiCall`] into one HTTP
//!   request and decodes the response envelope
//! - [`IncomingWebhook`]: posts raw payloads to a webhook URL
//!
//! Calls are spawned on the runtime in the client configuration and return
//! an [`InFlight`] handle:
//!
//! ```ignore
//! let config = Arc::new(ClientConfig::builder(Handle::current()).token("xoxb-...").build()?);
//! let chat = ResourceGroup::new("chat", config)?;
//!
//! let reply = chat
//!     .post("chat.postMessage", Params::new().with("channel", "C1").with("text", "hi"))
//!     .await?;
//! chat.close().await?;
//! ```

pub mod error;
pub mod executor;
pub mod group;
pub mod multipart;
pub mod pool;
pub mod registry;
pub mod webhook;

pub use executor::Executor;
pub use group::ResourceGroup;
pub use multipart::{MultipartBody, Part, PartContent};
pub use pool::ConnectionPool;
pub use registry::{InFlight, OperationRegistry, combine_drains};
pub use webhook::IncomingWebhook;
