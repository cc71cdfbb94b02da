// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Versioning engine: tagged history with a namespace-free live mirror.
//!
//! Every save writes the content twice. The history copy lands under a
//! namespace tree (`archive/<key>/<tag>`) and the live mirror under the bare
//! key (`<key>/<tag>`); both scopes also get their `latest` entry rewritten.
//! Reads of `latest` are cheap and need no namespace, while the full history
//! stays listable per namespace.
//!
//! # Example
//!
//! ```no_run
//! use tskv::engine::VersionedStore;
//! use tskv::record::Blob;
//! use tskv::storage::{MemoryBackend, Session};
//!
//! let session = Session::open(MemoryBackend::new()).unwrap();
//! let store = VersionedStore::with_defaults(&session);
//! let archive = store.archive().clone();
//!
//! store.save(&mut Blob::new("alpha", "v1"), &archive, "t1").unwrap();
//! store.save(&mut Blob::new("alpha", "v2"), &archive, "t2").unwrap();
//!
//! let mut current = Blob::empty("alpha");
//! store.get(&mut current, None).unwrap();
//! assert_eq!(current.content(), b"v2");
//!
//! let tags = store.get_versions(&current, &archive).unwrap();
//! assert_eq!(tags, vec!["latest", "t1", "t2"]);
//! ```

mod config;
mod error;
mod store;
mod tag;

pub use config::{EngineConfig, RollbackPolicy, DEFAULT_ARCHIVE_NAMESPACE};
pub use error::EngineError;
pub use store::VersionedStore;
pub use tag::{is_valid_tag, TagClock, LATEST};
