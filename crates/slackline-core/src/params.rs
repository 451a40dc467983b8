//! Call parameters and their URL encoding.
//!
//! Parameters are kept in insertion order. Sequence values are encoded as
//! repeated keys (`channel=C1&channel=C2`), never comma-joined. Null values
//! mean "omit this optional parameter" and produce no output at all.

use std::fmt;
use std::path::PathBuf;

/// The value of a single parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    /// An omitted optional parameter.
    Null,
    /// A scalar value in its string form.
    Text(String),
    /// A sequence value, encoded as one key per element.
    List(Vec<String>),
}

impl ParamValue {
    /// Check whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string forms this value expands to.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Null => &[],
            Self::Text(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Text(if value { "true" } else { "false" }.to_string())
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )*
    };
}

impl_from_number!(i32, i64, u32, u64, usize, f64);

impl<T: fmt::Display> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.iter().map(ToString::to_string).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// An ordered set of named parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a parameter, replacing an existing value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Get a parameter value.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Append all parameters of `other`, replacing duplicates.
    pub fn extend(&mut self, other: Params) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    /// Number of distinct keys, nulls included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over keys and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into key/value pairs, one pair per sequence element.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .flat_map(|(key, value)| {
                value
                    .values()
                    .iter()
                    .map(move |v| (key.clone(), v.clone()))
            })
            .collect()
    }

    /// Encode as `application/x-www-form-urlencoded`.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            for v in value.values() {
                serializer.append_pair(key, v);
            }
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Where the bytes of a file attachment come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSource {
    /// Read from the filesystem when the call executes.
    Path(PathBuf),
    /// Already in memory.
    Bytes {
        /// File name reported in the multipart part.
        file_name: String,
        /// File contents.
        bytes: Vec<u8>,
    },
}

impl FileSource {
    /// A file on disk.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// In-memory contents with a file name.
    pub fn bytes(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_key(encoded: &str, key: &str) -> usize {
        url::form_urlencoded::parse(encoded.as_bytes())
            .filter(|(k, _)| k == key)
            .count()
    }

    #[test]
    fn sequences_encode_as_repeated_keys() {
        for k in 0..6 {
            let values: Vec<String> = (0..k).map(|i| format!("C{i}")).collect();
            let encoded = Params::new().with("channel", values).encode();
            assert_eq!(count_key(&encoded, "channel"), k, "k = {k}: {encoded}");
            assert!(!encoded.contains("%2C"), "comma-joined: {encoded}");
        }
    }

    #[test]
    fn repeated_keys_keep_element_order() {
        let encoded = Params::new()
            .with("types", vec!["public_channel", "im"])
            .with("limit", 20)
            .encode();
        assert_eq!(encoded, "types=public_channel&types=im&limit=20");
    }

    #[test]
    fn nulls_are_omitted() {
        let params = Params::new()
            .with("title", "x")
            .with("filetype", None::<String>);
        assert_eq!(params.encode(), "title=x");
        assert_eq!(params.pairs(), vec![("title".to_string(), "x".to_string())]);
    }

    #[test]
    fn insert_replaces_existing_key() {
        let mut params = Params::new().with("token", "old");
        params.insert("token", "new");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("token"), Some(&ParamValue::from("new")));
    }

    #[test]
    fn special_characters_are_escaped() {
        let encoded = Params::new().with("text", "a&b=c d").encode();
        assert_eq!(encoded, "text=a%26b%3Dc+d");
    }

    #[test]
    fn booleans_render_lowercase() {
        let encoded = Params::new().with("as_user", true).encode();
        assert_eq!(encoded, "as_user=true");
    }

    #[test]
    fn collect_from_pairs() {
        let params: Params = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(params.encode(), "a=1&b=2");
    }
}
