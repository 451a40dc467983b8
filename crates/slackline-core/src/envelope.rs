//! Response envelope parsing.
//!
//! Every API response body is a JSON object following the
//! `{"ok": bool, "error": string?, ...}` convention. [`Envelope::parse`]
//! decodes it without ever failing: malformed bodies become unsuccessful
//! envelopes that still carry the raw text.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Error message used when an unsuccessful body has no `error` field.
pub const UNKNOWN_ERROR: &str = "unknown_error";

/// A decoded API response.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    raw: String,
    body: Value,
    successful: bool,
    error: Option<String>,
}

impl Envelope {
    /// Parse a raw response body.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match serde_json::from_str::<Value>(&raw) {
            Ok(body) => {
                let successful = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
                let error = if successful {
                    None
                } else {
                    Some(
                        body.get("error")
                            .and_then(Value::as_str)
                            .unwrap_or(UNKNOWN_ERROR)
                            .to_string(),
                    )
                };
                Self {
                    raw,
                    body,
                    successful,
                    error,
                }
            }
            Err(err) => Self {
                error: Some(format!("invalid_json: {err}")),
                raw,
                body: Value::Null,
                successful: false,
            },
        }
    }

    /// Whether the server reported `ok: true`.
    pub fn is_successful(&self) -> bool {
        self.successful
    }

    /// The error message of an unsuccessful envelope.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The decoded body. `Null` when the body was not valid JSON.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Get a top-level field of the payload.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// The raw response text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Take the decoded body.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Deserialize the payload into a typed value.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(T::deserialize(&self.body)?)
    }

    /// Turn an unsuccessful envelope into an [`Error::Api`].
    pub fn into_result(self) -> Result<Self> {
        if self.successful {
            Ok(self)
        } else {
            let message = self.error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            Err(Error::Api(message))
        }
    }
}
