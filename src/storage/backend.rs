// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The backend adapter trait.

use std::sync::Arc;

use super::error::StorageError;

/// Maximum key size in bytes.
pub const MAX_KEY_SIZE: usize = 8 * 1024; // 8KB

/// Maximum value size in bytes, matching the coordination store's KV ceiling.
pub const MAX_VALUE_SIZE: usize = 512 * 1024; // 512KB

/// Primitive operations the versioning engine needs from a coordination store.
///
/// Keys are full `/`-separated addresses. Every operation other than
/// [`setup`](Backend::setup) fails with [`StorageError::NoSession`] until a
/// session has been established, and again after [`teardown`](Backend::teardown).
pub trait Backend: Send + Sync {
    /// Establishes the session. Fails fast with
    /// [`StorageError::BackendUnavailable`] when the store cannot be reached.
    fn setup(&self) -> Result<(), StorageError>;

    /// Ends the session, releasing every lock acquired within it.
    fn teardown(&self) -> Result<(), StorageError>;

    /// Reads a raw key. `Ok(None)` means the key was never written.
    fn get_key(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Writes a raw key, replacing any previous value.
    fn save_key(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Lists keys beginning with `prefix`, in lexicographic order.
    ///
    /// With a separator, only immediate children of `prefix` are returned:
    /// deeper keys collapse into one entry ending at the first separator
    /// after the prefix.
    fn get_keys(&self, prefix: &str, separator: Option<char>) -> Result<Vec<String>, StorageError>;

    /// Deletes every key beginning with `prefix`.
    fn delete_keys(&self, prefix: &str) -> Result<(), StorageError>;

    /// Acquires the advisory lock `name` for `holder`.
    ///
    /// Fails with [`StorageError::LockContention`] while the lock is held,
    /// including by the same holder.
    fn lock(&self, name: &str, holder: &str) -> Result<(), StorageError>;

    /// Releases the advisory lock `name`. Releasing a free lock succeeds.
    fn unlock(&self, name: &str) -> Result<(), StorageError>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn setup(&self) -> Result<(), StorageError> {
        (**self).setup()
    }

    fn teardown(&self) -> Result<(), StorageError> {
        (**self).teardown()
    }

    fn get_key(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get_key(key)
    }

    fn save_key(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).save_key(key, value)
    }

    fn get_keys(&self, prefix: &str, separator: Option<char>) -> Result<Vec<String>, StorageError> {
        (**self).get_keys(prefix, separator)
    }

    fn delete_keys(&self, prefix: &str) -> Result<(), StorageError> {
        (**self).delete_keys(prefix)
    }

    fn lock(&self, name: &str, holder: &str) -> Result<(), StorageError> {
        (**self).lock(name, holder)
    }

    fn unlock(&self, name: &str) -> Result<(), StorageError> {
        (**self).unlock(name)
    }
}
