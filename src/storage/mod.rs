// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Backend adapter layer.
//!
//! The versioning engine talks to its coordination store only through the
//! [`Backend`] trait: raw get/put/list/delete on `/`-separated keys, named
//! advisory locks, and a session lifecycle bracketing all of it.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryBackend`]: a sorted in-memory map, used by tests and embedders
//! - [`RocksBackend`]: a local RocksDB database, used by the `tskv` binary
//!
//! # Example
//!
//! ```no_run
//! use tskv::storage::{Backend, RocksBackend, Session};
//! use std::path::Path;
//!
//! let session = Session::open(RocksBackend::new(Path::new("/tmp/tskv"))).unwrap();
//! session.backend().save_key("archive/alpha/t1", b"v1").unwrap();
//!
//! let tags = session.backend().get_keys("archive/alpha/", Some('/')).unwrap();
//! println!("{:?}", tags);
//! session.close().unwrap();
//! ```

mod backend;
mod error;
mod key;
mod lock_table;
mod memory;
mod rocks;
mod session;

pub use backend::{Backend, MAX_KEY_SIZE, MAX_VALUE_SIZE};
pub use error::StorageError;
pub use key::{
    collapse_children, validate_key, validate_key_within, validate_value, validate_value_within,
};
pub use lock_table::{new_holder_token, LockInfo, LockTable};
pub use memory::MemoryBackend;
pub use rocks::{DurabilityMode, RocksBackend, RocksConfig};
pub use session::Session;
