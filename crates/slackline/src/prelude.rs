//! Commonly used types.
//!
//! ```ignore
//! use slackline::prelude::*;
//! ```

pub use crate::SlackClient;
pub use crate::groups::{Endpoints, UploadOptions};
pub use slackline_core::{ApiCall, ClientConfig, Envelope, Error, ErrorKind, FileSource, Params};
pub use slackline_net::InFlight;
