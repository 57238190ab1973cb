use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a document whose settings are tracked.
///
/// A `DocumentKey` is an opaque, non-empty string supplied by the caller,
/// typically the absolute path of the document file. Keys compare by exact
/// string equality; no path normalization is applied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Create a key, rejecting the empty string.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TypeError::EmptyKey);
        }
        Ok(Self(key))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path component, for display in titles and listings.
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit(|c: char| c == '/' || c == '\\')
            .find(|part| !part.is_empty())
            .unwrap_or(self.0.as_str())
    }
}

impl fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentKey({})", self.0)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for DocumentKey {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentKey> for String {
    fn from(key: DocumentKey) -> Self {
        key.0
    }
}

impl Borrow<str> for DocumentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_rejected() {
        assert_eq!(DocumentKey::new(""), Err(TypeError::EmptyKey));
    }

    #[test]
    fn file_name_strips_directories() {
        let key = DocumentKey::new("/books/rust/nomicon.pdf").unwrap();
        assert_eq!(key.file_name(), "nomicon.pdf");

        let key = DocumentKey::new(r"C:\docs\manual.djvu").unwrap();
        assert_eq!(key.file_name(), "manual.djvu");

        let key = DocumentKey::new("plain.pdf").unwrap();
        assert_eq!(key.file_name(), "plain.pdf");
    }

    #[test]
    fn serializes_as_bare_string() {
        let key = DocumentKey::new("/a/b.pdf").unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"/a/b.pdf\"");
    }

    #[test]
    fn deserializing_empty_string_fails() {
        let parsed: Result<DocumentKey, _> = serde_json::from_str("\"\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn lookup_by_str_in_map() {
        let mut map = std::collections::HashMap::new();
        map.insert(DocumentKey::new("x.pdf").unwrap(), 1);
        assert_eq!(map.get("x.pdf"), Some(&1));
    }
}
