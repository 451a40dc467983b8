//! Description of one logical API call.

use std::fmt;

use crate::params::{FileSource, ParamValue, Params};

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// A verb, an API method path and its parameters.
///
/// `params` always travel in the query string. `data` is the form body of a
/// POST. When `files` is non-empty a POST is sent as multipart instead, built
/// from `files` and `data`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiCall {
    /// The HTTP verb.
    pub method: HttpMethod,
    /// The API method name, e.g. `chat.postMessage`.
    pub path: String,
    /// Query parameters.
    pub params: Params,
    /// Body fields.
    pub data: Params,
    /// File attachments by field name.
    pub files: Vec<(String, FileSource)>,
}

impl ApiCall {
    /// Create a call with no parameters.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            data: Params::new(),
            files: Vec::new(),
        }
    }

    /// Create a GET call.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST call.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Replace the query parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Add a body field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.data.insert(key, value);
        self
    }

    /// Replace the body fields.
    pub fn data(mut self, data: Params) -> Self {
        self.data = data;
        self
    }

    /// Attach a file under a field name.
    pub fn file(mut self, name: impl Into<String>, source: FileSource) -> Self {
        self.files.push((name.into(), source));
        self
    }

    /// Whether this call is sent as a multipart form.
    pub fn is_multipart(&self) -> bool {
        self.method == HttpMethod::Post && !self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_post_with_files_is_multipart() {
        let upload = ApiCall::post("files.upload").file("file", FileSource::bytes("a.txt", "hi"));
        assert!(upload.is_multipart());

        assert!(!ApiCall::post("chat.postMessage").field("text", "hi").is_multipart());
        assert!(
            !ApiCall::get("files.info")
                .file("file", FileSource::bytes("a.txt", "hi"))
                .is_multipart()
        );
    }

    #[test]
    fn builder_collects_params_and_data() {
        let call = ApiCall::post("chat.postMessage")
            .param("pretty", 1)
            .field("channel", "C1")
            .field("text", "hello");
        assert_eq!(call.method, HttpMethod::Post);
        assert_eq!(call.params.encode(), "pretty=1");
        assert_eq!(call.data.encode(), "channel=C1&text=hello");
    }
}
