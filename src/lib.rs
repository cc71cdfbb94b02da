// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! tskv: versioned key-value storage over a coordination store.
//!
//! Successive tagged versions of a value are stored under a key. The latest
//! or any tagged version can be read back, the tag history listed, a key
//! rolled back to an earlier tag, and concurrent writers fenced with
//! advisory locks. The coordination store itself sits behind the
//! [`storage::Backend`] trait.

pub mod engine;
pub mod lock;
pub mod record;
pub mod storage;
pub mod tree;

pub use engine::{EngineConfig, EngineError, RollbackPolicy, TagClock, VersionedStore, LATEST};
pub use lock::LockGuard;
pub use record::{Blob, RecordError, TextRecord, VersionedRecord};
pub use storage::{Backend, MemoryBackend, RocksBackend, RocksConfig, Session, StorageError};
pub use tree::{join_path, Tree, SEPARATOR};
