//! Multipart form bodies for file uploads.

use std::path::Path;

use slackline_core::logging::targets;
use slackline_core::{Error, FileSource, Params, Result};

/// The content of one multipart part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PartContent {
    /// A binary file part.
    File {
        /// File name reported to the server.
        file_name: String,
        /// File contents.
        bytes: Vec<u8>,
    },
    /// A text field.
    Text(String),
}

/// A named multipart part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    /// The form field name.
    pub name: String,
    /// The part content.
    pub content: PartContent,
}

/// A multipart form assembled from file sources and scalar fields.
///
/// The body stays inspectable until it is converted with
/// [`MultipartBody::into_form`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartBody {
    parts: Vec<Part>,
}

impl MultipartBody {
    /// Read every file source and attach it, then attach the non-null fields.
    ///
    /// Fields whose value is null are left out entirely. Sequence fields
    /// produce one part per element.
    pub async fn build(files: &[(String, FileSource)], fields: &Params) -> Result<Self> {
        let mut parts = Vec::with_capacity(files.len() + fields.len());

        for (name, source) in files {
            let (file_name, bytes) = match source {
                FileSource::Path(path) => (file_name_of(path), read_file(path).await?),
                FileSource::Bytes { file_name, bytes } => (file_name.clone(), bytes.clone()),
            };
            tracing::trace!(
                target: targets::MULTIPART,
                field = %name,
                file_name = %file_name,
                size = bytes.len(),
                "attached file part"
            );
            parts.push(Part {
                name: name.clone(),
                content: PartContent::File { file_name, bytes },
            });
        }

        for (key, value) in fields.pairs() {
            parts.push(Part {
                name: key,
                content: PartContent::Text(value),
            });
        }

        Ok(Self { parts })
    }

    /// All parts in attachment order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// The first part with the given name.
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Convert into a reqwest form.
    pub fn into_form(self) -> reqwest::multipart::Form {
        self.parts
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, part| match part.content {
                PartContent::File { file_name, bytes } => form.part(
                    part.name,
                    reqwest::multipart::Part::bytes(bytes).file_name(file_name),
                ),
                PartContent::Text(text) => form.text(part.name, text),
            })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::Io(format!("{}: {e}", path.display())))
}
