// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! RocksDB-backed local coordination store.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options, WriteBatch, WriteOptions};
use tracing::{debug, info};

use super::key::{collapse_children, validate_key_within, validate_value_within};
use super::{Backend, LockTable, StorageError, MAX_KEY_SIZE, MAX_VALUE_SIZE};

type Db = DBWithThreadMode<MultiThreaded>;

/// Durability mode for write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Writes are synced to WAL but not fsynced to disk.
    /// Durable against process crashes but not power failures.
    #[default]
    WalOnly,
    /// Writes are fsynced to disk on every operation.
    FsyncEveryWrite,
}

/// Configuration for [`RocksBackend`].
#[derive(Debug, Clone)]
pub struct RocksConfig {
    /// Database directory, created on first setup.
    pub path: PathBuf,
    /// Write durability.
    pub durability: DurabilityMode,
    /// Longest key accepted, in bytes.
    pub max_key_size: usize,
    /// Longest value accepted, in bytes.
    pub max_value_size: usize,
}

impl RocksConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            durability: DurabilityMode::default(),
            max_key_size: MAX_KEY_SIZE,
            max_value_size: MAX_VALUE_SIZE,
        }
    }

    /// Sets the write durability mode.
    pub fn with_durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Sets the key size limit.
    pub fn with_max_key_size(mut self, max: usize) -> Self {
        self.max_key_size = max;
        self
    }

    /// Sets the value size limit.
    pub fn with_max_value_size(mut self, max: usize) -> Self {
        self.max_value_size = max;
        self
    }
}

/// Backend storing keys in a RocksDB database.
///
/// The database is opened by `setup()` and closed by `teardown()`. Locks
/// live in memory for the lifetime of the session; RocksDB itself allows a
/// single process per database directory, so they only need to exclude
/// writers within that process.
pub struct RocksBackend {
    config: RocksConfig,
    db: RwLock<Option<Db>>,
    write_opts: WriteOptions,
    locks: LockTable,
}

impl RocksBackend {
    /// Creates a backend for the database at `path` without opening it.
    pub fn new(path: &Path) -> Self {
        Self::with_config(RocksConfig::new(path))
    }

    pub fn with_config(config: RocksConfig) -> Self {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(config.durability == DurabilityMode::FsyncEveryWrite);

        Self {
            config,
            db: RwLock::new(None),
            write_opts,
            locks: LockTable::new(),
        }
    }

    /// Path of the database directory.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Forces a flush of the memtables to disk.
    pub fn sync(&self) -> Result<(), StorageError> {
        let db = self.db.read();
        let db = db.as_ref().ok_or(StorageError::NoSession)?;
        db.flush()?;
        Ok(())
    }

    fn open_db(&self) -> Result<Db, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);

        Db::open(&opts, &self.config.path).map_err(|e| {
            StorageError::BackendUnavailable(format!(
                "cannot open {}: {}",
                self.config.path.display(),
                e
            ))
        })
    }

    /// Keys at or after `prefix` that still start with it, in byte order.
    fn scan_prefix(db: &Db, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();

        for item in db.iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward)) {
            let (key, _) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| StorageError::InvalidKey(format!("non-utf8 key in store: {}", e)))?;
            keys.push(key);
        }

        Ok(keys)
    }
}

impl Backend for RocksBackend {
    fn setup(&self) -> Result<(), StorageError> {
        let mut db = self.db.write();
        if db.is_none() {
            *db = Some(self.open_db()?);
            info!(path = %self.config.path.display(), "rocksdb session established");
        }
        Ok(())
    }

    fn teardown(&self) -> Result<(), StorageError> {
        if let Some(db) = self.db.write().take() {
            let released = self.locks.release_all();
            db.flush()?;
            info!(path = %self.config.path.display(), released, "rocksdb session closed");
        }
        Ok(())
    }

    fn get_key(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_key_within(key, self.config.max_key_size)?;

        let db = self.db.read();
        let db = db.as_ref().ok_or(StorageError::NoSession)?;
        Ok(db.get(key.as_bytes())?)
    }

    fn save_key(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        validate_key_within(key, self.config.max_key_size)?;
        validate_value_within(value, self.config.max_value_size)?;

        let db = self.db.read();
        let db = db.as_ref().ok_or(StorageError::NoSession)?;
        db.put_opt(key.as_bytes(), value, &self.write_opts)?;
        Ok(())
    }

    fn get_keys(&self, prefix: &str, separator: Option<char>) -> Result<Vec<String>, StorageError> {
        let db = self.db.read();
        let db = db.as_ref().ok_or(StorageError::NoSession)?;

        let keys = Self::scan_prefix(db, prefix)?;
        Ok(collapse_children(prefix, keys, separator))
    }

    fn delete_keys(&self, prefix: &str) -> Result<(), StorageError> {
        let db = self.db.read();
        let db = db.as_ref().ok_or(StorageError::NoSession)?;

        let keys = Self::scan_prefix(db, prefix)?;
        for chunk in keys.chunks(1000) {
            let mut batch = WriteBatch::default();
            for key in chunk {
                batch.delete(key.as_bytes());
            }
            db.write_opt(batch, &self.write_opts)?;
        }

        debug!(prefix, deleted = keys.len(), "deleted keys");
        Ok(())
    }

    // The read guard is held across the table call; teardown takes the
    // write guard before clearing the table.
    fn lock(&self, name: &str, holder: &str) -> Result<(), StorageError> {
        validate_key_within(name, self.config.max_key_size)?;
        let db = self.db.read();
        if db.is_none() {
            return Err(StorageError::NoSession);
        }

        self.locks.acquire(name, holder)
    }

    fn unlock(&self, name: &str) -> Result<(), StorageError> {
        let db = self.db.read();
        if db.is_none() {
            return Err(StorageError::NoSession);
        }

        self.locks.release(name);
        Ok(())
    }
}
