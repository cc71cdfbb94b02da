// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! In-process backend for tests and embedding.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use super::key::{collapse_children, validate_key, validate_value};
use super::{Backend, LockTable, StorageError};

/// Backend keeping every key in a sorted in-memory map.
///
/// Behaves like a coordination store with a single session: operations fail
/// with [`StorageError::NoSession`] outside `setup()`/`teardown()`, and
/// teardown drops every lock taken during the session. Data survives
/// teardown so a later session sees it again.
pub struct MemoryBackend {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    locks: LockTable,
    session: RwLock<Option<String>>,
    reachable: bool,
    rejected_prefixes: RwLock<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            locks: LockTable::new(),
            session: RwLock::new(None),
            reachable: true,
            rejected_prefixes: RwLock::new(Vec::new()),
        }
    }

    /// Creates a backend whose `setup()` always fails, standing in for an
    /// unreachable store.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Makes every write to a key under `prefix` fail with
    /// [`StorageError::BackendUnavailable`].
    pub fn reject_writes_under(&self, prefix: impl Into<String>) {
        self.rejected_prefixes.write().push(prefix.into());
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Identifier of the active session, if any.
    pub fn session_id(&self) -> Option<String> {
        self.session.read().clone()
    }

    fn ensure_session(&self) -> Result<(), StorageError> {
        if self.session.read().is_none() {
            return Err(StorageError::NoSession);
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn setup(&self) -> Result<(), StorageError> {
        if !self.reachable {
            return Err(StorageError::BackendUnavailable(
                "memory backend marked unreachable".to_string(),
            ));
        }

        let mut session = self.session.write();
        if session.is_none() {
            let id = super::new_holder_token();
            debug!(session = %id, "memory session established");
            *session = Some(id);
        }
        Ok(())
    }

    fn teardown(&self) -> Result<(), StorageError> {
        if let Some(id) = self.session.write().take() {
            let released = self.locks.release_all();
            debug!(session = %id, released, "memory session closed");
        }
        Ok(())
    }

    fn get_key(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.ensure_session()?;
        validate_key(key)?;

        Ok(self.data.read().get(key).cloned())
    }

    fn save_key(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.ensure_session()?;
        validate_key(key)?;
        validate_value(value)?;

        if self
            .rejected_prefixes
            .read()
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
        {
            return Err(StorageError::BackendUnavailable(format!(
                "write to {} rejected",
                key
            )));
        }

        self.data.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_keys(&self, prefix: &str, separator: Option<char>) -> Result<Vec<String>, StorageError> {
        self.ensure_session()?;

        let data = self.data.read();
        let keys = data
            .range(prefix.to_string()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix));

        Ok(collapse_children(prefix, keys, separator))
    }

    fn delete_keys(&self, prefix: &str) -> Result<(), StorageError> {
        self.ensure_session()?;

        self.data.write().retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }

    fn lock(&self, name: &str, holder: &str) -> Result<(), StorageError> {
        validate_key(name)?;
        let session = self.session.read();
        if session.is_none() {
            return Err(StorageError::NoSession);
        }

        self.locks.acquire(name, holder)
    }

    fn unlock(&self, name: &str) -> Result<(), StorageError> {
        let session = self.session.read();
        if session.is_none() {
            return Err(StorageError::NoSession);
        }

        self.locks.release(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.setup().unwrap();
        backend
    }

    #[test]
    fn test_requires_session() {
        let backend = MemoryBackend::new();
        assert!(matches!(backend.get_key("k"), Err(StorageError::NoSession)));
        assert!(matches!(
            backend.save_key("k", b"v"),
            Err(StorageError::NoSession)
        ));
        assert!(matches!(
            backend.lock("k", "c1"),
            Err(StorageError::NoSession)
        ));
    }

    #[test]
    fn test_unreachable_setup_fails() {
        let backend = MemoryBackend::unreachable();
        assert!(matches!(
            backend.setup(),
            Err(StorageError::BackendUnavailable(_))
        ));
        assert!(backend.session_id().is_none());
    }

    #[test]
    fn test_save_and_get() {
        let backend = open_backend();
        backend.save_key("a/b", b"value").unwrap();

        assert_eq!(backend.get_key("a/b").unwrap(), Some(b"value".to_vec()));
        assert_eq!(backend.get_key("a/c").unwrap(), None);
    }

    #[test]
    fn test_empty_value_is_distinct_from_absent() {
        let backend = open_backend();
        backend.save_key("k", b"").unwrap();

        assert_eq!(backend.get_key("k").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_get_keys_with_separator() {
        let backend = open_backend();
        for key in ["workspaces/w1/latest", "workspaces/w1/t1", "workspaces/w2/latest", "other/x"] {
            backend.save_key(key, b"").unwrap();
        }

        let keys = backend.get_keys("workspaces/", Some('/')).unwrap();
        assert_eq!(keys, vec!["workspaces/w1/", "workspaces/w2/"]);

        let all = backend.get_keys("workspaces/", None).unwrap();
        assert_eq!(all.len(), 3);
        for key in all {
            assert_eq!(key.split('/').count(), 3);
        }
    }

    #[test]
    fn test_delete_keys() {
        let backend = open_backend();
        backend.save_key("a/1", b"").unwrap();
        backend.save_key("a/2", b"").unwrap();
        backend.save_key("b/1", b"").unwrap();

        backend.delete_keys("a/").unwrap();
        assert_eq!(backend.len(), 1);
        assert!(backend.get_key("b/1").unwrap().is_some());
    }

    #[test]
    fn test_teardown_releases_locks_and_keeps_data() {
        let backend = open_backend();
        backend.save_key("k", b"v").unwrap();
        backend.lock("k", "c1").unwrap();

        backend.teardown().unwrap();
        backend.setup().unwrap();

        backend.lock("k", "c2").unwrap();
        assert_eq!(backend.get_key("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_rejected_writes() {
        let backend = open_backend();
        backend.reject_writes_under("live/");

        assert!(backend.save_key("archive/k", b"v").is_ok());
        assert!(matches!(
            backend.save_key("live/k", b"v"),
            Err(StorageError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_teardown_never_leaks_concurrent_locks() {
        let backend = open_backend();

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..500 {
                    let _ = backend.lock(&format!("n{}", i), "c1");
                }
            });
            backend.teardown().unwrap();
        });

        backend.setup().unwrap();
        for i in 0..500 {
            backend.lock(&format!("n{}", i), "c2").unwrap();
        }
    }
}
