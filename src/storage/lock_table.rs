// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Session-scoped advisory lock table.
//!
//! A lock is a `(name, holder)` pair held by at most one holder at a time.
//! Acquisition is not reentrant: asking for a held lock fails with
//! [`StorageError::LockContention`] even when the holder token matches.
//! Release is idempotent.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

use parking_lot::RwLock;

use super::StorageError;

const NUM_SHARDS: usize = 64;

/// Returns a fresh random holder token.
pub fn new_holder_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A lock currently held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    /// Lock name.
    pub name: String,
    /// Token of the holder.
    pub holder: String,
    /// When the lock was acquired.
    pub acquired_at: SystemTime,
}

struct LockEntry {
    holder: String,
    acquired_at: SystemTime,
}

/// Sharded lock table. Each shard is protected by a RwLock.
pub struct LockTable {
    shards: [RwLock<HashMap<String, LockEntry>>; NUM_SHARDS],
}

impl LockTable {
    pub fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| RwLock::new(HashMap::new())),
        }
    }

    #[inline]
    fn shard_index(&self, name: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        hasher.finish() as usize % NUM_SHARDS
    }

    /// Acquires `name` for `holder`.
    pub fn acquire(&self, name: &str, holder: &str) -> Result<(), StorageError> {
        let mut shard = self.shards[self.shard_index(name)].write();

        if let Some(entry) = shard.get(name) {
            return Err(StorageError::LockContention {
                name: name.to_string(),
                holder: entry.holder.clone(),
            });
        }

        shard.insert(
            name.to_string(),
            LockEntry {
                holder: holder.to_string(),
                acquired_at: SystemTime::now(),
            },
        );
        Ok(())
    }

    /// Releases `name`. Returns whether a lock was actually held.
    pub fn release(&self, name: &str) -> bool {
        self.shards[self.shard_index(name)]
            .write()
            .remove(name)
            .is_some()
    }

    /// Releases every lock, returning how many were held.
    pub fn release_all(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                let mut shard = shard.write();
                let held = shard.len();
                shard.clear();
                held
            })
            .sum()
    }

    /// Gets the current holder of `name`, if any.
    pub fn get(&self, name: &str) -> Option<LockInfo> {
        let shard = self.shards[self.shard_index(name)].read();

        shard.get(name).map(|entry| LockInfo {
            name: name.to_string(),
            holder: entry.holder.clone(),
            acquired_at: entry.acquired_at,
        })
    }

    /// Number of locks currently held.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_free_lock() {
        let table = LockTable::new();
        table.acquire("key3", "c1").unwrap();

        let lock = table.get("key3").unwrap();
        assert_eq!(lock.name, "key3");
        assert_eq!(lock.holder, "c1");
    }

    #[test]
    fn test_contention_reports_holder() {
        let table = LockTable::new();
        table.acquire("key3", "c1").unwrap();

        match table.acquire("key3", "c12") {
            Err(StorageError::LockContention { name, holder }) => {
                assert_eq!(name, "key3");
                assert_eq!(holder, "c1");
            }
            other => panic!("expected LockContention, got {:?}", other),
        }
    }

    #[test]
    fn test_same_holder_is_not_reentrant() {
        let table = LockTable::new();
        table.acquire("k", "c1").unwrap();
        assert!(matches!(
            table.acquire("k", "c1"),
            Err(StorageError::LockContention { .. })
        ));
    }

    #[test]
    fn test_release_is_idempotent() {
        let table = LockTable::new();
        table.acquire("k", "c1").unwrap();

        assert!(table.release("k"));
        assert!(!table.release("k"));
        assert!(table.get("k").is_none());

        table.acquire("k", "c2").unwrap();
        assert_eq!(table.get("k").unwrap().holder, "c2");
    }

    #[test]
    fn test_release_all() {
        let table = LockTable::new();
        for i in 0..10 {
            table.acquire(&format!("lock{}", i), "c1").unwrap();
        }
        assert_eq!(table.len(), 10);

        assert_eq!(table.release_all(), 10);
        assert!(table.is_empty());
    }

    #[test]
    fn test_holder_tokens_are_unique() {
        assert_ne!(new_holder_token(), new_holder_token());
    }
}
