// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The contract every storable value satisfies.
//!
//! A record carries its own key, knows how to turn its content into bytes
//! and back, and receives the tag of the backend entry it was last saved
//! under or read from.

use crate::tree::{scoped_path, Tree};

/// Errors raised while decoding record content.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed record content: {0}")]
    Malformed(String),
}

/// A value the versioning engine can store.
pub trait VersionedRecord {
    /// Returns the record's key. Separators inside the key nest it deeper.
    fn key(&self) -> &str;

    /// Renders the record's address under `tree`, or under the root
    /// namespace when `tree` is `None`.
    fn make_path(&self, tree: Option<&Tree>) -> String {
        scoped_path(tree, self.key())
    }

    /// Serializes the content for storage.
    fn marshal(&self) -> Result<Vec<u8>, RecordError>;

    /// Replaces the content with bytes read from storage.
    ///
    /// Absent content arrives as an empty vector, never as a missing value.
    fn unmarshal(&mut self, bytes: Vec<u8>) -> Result<(), RecordError>;

    /// Receives the tag of the entry that was just written or read.
    fn save_id(&mut self, tag: &str);

    /// Whether the marshalled bytes are compressed.
    fn is_compressed(&self) -> bool {
        false
    }
}

/// Opaque byte content under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    key: String,
    content: Vec<u8>,
    saved_as: Option<String>,
}

impl Blob {
    /// Creates a blob with the given content.
    pub fn new(key: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
            saved_as: None,
        }
    }

    /// Creates a blob with no content, ready to be read into.
    pub fn empty(key: impl Into<String>) -> Self {
        Self::new(key, Vec::new())
    }

    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    pub fn into_content(self) -> Vec<u8> {
        self.content
    }

    /// Tag of the last entry this blob was saved under or read from.
    pub fn saved_as(&self) -> Option<&str> {
        self.saved_as.as_deref()
    }
}

impl VersionedRecord for Blob {
    fn key(&self) -> &str {
        &self.key
    }

    fn marshal(&self) -> Result<Vec<u8>, RecordError> {
        Ok(self.content.clone())
    }

    fn unmarshal(&mut self, bytes: Vec<u8>) -> Result<(), RecordError> {
        self.content = bytes;
        Ok(())
    }

    fn save_id(&mut self, tag: &str) {
        self.saved_as = Some(tag.to_string());
    }
}

/// UTF-8 text content under a key.
///
/// Reading bytes that are not valid UTF-8 fails with
/// [`RecordError::Malformed`] and leaves the previous text in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    key: String,
    text: String,
    saved_as: Option<String>,
}

impl TextRecord {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            saved_as: None,
        }
    }

    pub fn empty(key: impl Into<String>) -> Self {
        Self::new(key, String::new())
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn saved_as(&self) -> Option<&str> {
        self.saved_as.as_deref()
    }
}

impl VersionedRecord for TextRecord {
    fn key(&self) -> &str {
        &self.key
    }

    fn marshal(&self) -> Result<Vec<u8>, RecordError> {
        Ok(self.text.as_bytes().to_vec())
    }

    fn unmarshal(&mut self, bytes: Vec<u8>) -> Result<(), RecordError> {
        self.text = String::from_utf8(bytes)
            .map_err(|e| RecordError::Malformed(format!("key {}: {}", self.key, e)))?;
        Ok(())
    }

    fn save_id(&mut self, tag: &str) {
        self.saved_as = Some(tag.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_path_matches_tree_join() {
        let blob = Blob::empty("hello/world");
        let tree = Tree::new(["archive", "team"]);

        assert_eq!(blob.make_path(Some(&tree)), tree.join("hello/world"));
        assert_eq!(blob.make_path(Some(&tree)), "archive/team/hello/world");
        assert_eq!(blob.make_path(None), "hello/world");
    }

    #[test]
    fn test_blob_unmarshal_empty() {
        let mut blob = Blob::new("k", "stale");
        blob.unmarshal(Vec::new()).unwrap();
        assert_eq!(blob.content(), b"");
    }

    #[test]
    fn test_blob_save_id() {
        let mut blob = Blob::new("k", "v");
        assert_eq!(blob.saved_as(), None);
        blob.save_id("t1");
        assert_eq!(blob.saved_as(), Some("t1"));
        assert!(!blob.is_compressed());
    }

    #[test]
    fn test_text_record_rejects_invalid_utf8() {
        let mut record = TextRecord::new("k", "kept");
        let result = record.unmarshal(vec![0xff, 0xfe]);

        assert!(matches!(result, Err(RecordError::Malformed(_))));
        assert_eq!(record.text(), "kept");
    }

    #[test]
    fn test_text_record_roundtrip() {
        let record = TextRecord::new("k", "héllo");
        let bytes = record.marshal().unwrap();

        let mut read = TextRecord::empty("k");
        read.unmarshal(bytes).unwrap();
        assert_eq!(read.text(), "héllo");
    }
}
