// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Raw key validation and hierarchy-aware listing.
//!
//! Both backends keep keys in byte order, so a listing is a range scan
//! followed by [`collapse_children`] when a separator is requested.

use super::{StorageError, MAX_KEY_SIZE, MAX_VALUE_SIZE};

/// Rejects empty keys and keys longer than [`MAX_KEY_SIZE`].
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    validate_key_within(key, MAX_KEY_SIZE)
}

/// Rejects empty keys and keys longer than `max` bytes.
pub fn validate_key_within(key: &str, max: usize) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("empty key".to_string()));
    }
    if key.len() > max {
        return Err(StorageError::KeyTooLarge {
            size: key.len(),
            max,
        });
    }
    Ok(())
}

/// Rejects values longer than [`MAX_VALUE_SIZE`]. Empty values are allowed.
pub fn validate_value(value: &[u8]) -> Result<(), StorageError> {
    validate_value_within(value, MAX_VALUE_SIZE)
}

pub fn validate_value_within(value: &[u8], max: usize) -> Result<(), StorageError> {
    if value.len() > max {
        return Err(StorageError::ValueTooLarge {
            size: value.len(),
            max,
        });
    }
    Ok(())
}

/// Reduces sorted keys under `prefix` to the entries a listing returns.
///
/// Keys not starting with `prefix` are skipped. Without a separator every
/// remaining key is returned unchanged. With one, a key whose remainder
/// contains the separator is cut just after its first occurrence, and
/// repeated cuts are emitted once.
pub fn collapse_children<I, S>(prefix: &str, keys: I, separator: Option<char>) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();

    for key in keys {
        let key = key.as_ref();
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };

        let entry = match separator.and_then(|sep| rest.find(sep).map(|i| (i, sep))) {
            Some((i, sep)) => &key[..prefix.len() + i + sep.len_utf8()],
            None => key,
        };

        if out.last().map(String::as_str) != Some(entry) {
            out.push(entry.to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("a/b").is_ok());
        assert!(matches!(validate_key(""), Err(StorageError::InvalidKey(_))));

        let large = "k".repeat(MAX_KEY_SIZE + 1);
        assert!(matches!(
            validate_key(&large),
            Err(StorageError::KeyTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_value() {
        assert!(validate_value(b"").is_ok());
        assert!(matches!(
            validate_value(&vec![0u8; MAX_VALUE_SIZE + 1]),
            Err(StorageError::ValueTooLarge { .. })
        ));
    }

    #[test]
    fn test_validate_with_custom_limits() {
        assert!(validate_key_within("abcd", 4).is_ok());
        assert!(matches!(
            validate_key_within("abcde", 4),
            Err(StorageError::KeyTooLarge { size: 5, max: 4 })
        ));
        assert!(validate_value_within(b"xy", 2).is_ok());
        assert!(matches!(
            validate_value_within(b"xyz", 2),
            Err(StorageError::ValueTooLarge { size: 3, max: 2 })
        ));
    }

    #[test]
    fn test_collapse_without_separator() {
        let keys = ["a/x", "a/y/z", "b/x"];
        assert_eq!(collapse_children("a/", keys, None), vec!["a/x", "a/y/z"]);
    }

    #[test]
    fn test_collapse_immediate_children() {
        let keys = ["ws/a/1", "ws/a/2", "ws/b", "ws/c/d/e", "wt/x"];
        assert_eq!(
            collapse_children("ws/", keys, Some('/')),
            vec!["ws/a/", "ws/b", "ws/c/"]
        );
    }

    #[test]
    fn test_collapse_separator_only_after_prefix() {
        let keys = ["archive/alpha/latest", "archive/alpha/t1"];
        assert_eq!(
            collapse_children("archive/alpha/", keys, Some('/')),
            vec!["archive/alpha/latest", "archive/alpha/t1"]
        );
    }
}
