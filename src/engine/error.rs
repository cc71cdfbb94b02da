// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Versioning engine error types.

use crate::record::RecordError;
use crate::storage::StorageError;

/// Errors that can occur in versioning operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("version {tag:?} not found at {path}")]
    NotFound { path: String, tag: String },

    /// Some entries of a save landed before a later write failed. `written`
    /// lists them in write order; `failed` is the address that was refused.
    #[error("wrote {written:?} but write to {failed} failed: {source}")]
    PartialSave {
        written: Vec<String>,
        failed: String,
        #[source]
        source: StorageError,
    },

    #[error("invalid key {0:?}")]
    InvalidKey(String),

    #[error("invalid tag {0:?}")]
    InvalidTag(String),

    #[error(transparent)]
    Malformed(#[from] RecordError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// True when an explicitly requested version was never written.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }

    /// True when a lock was refused because someone else holds it.
    pub fn is_lock_contention(&self) -> bool {
        matches!(
            self,
            EngineError::Storage(StorageError::LockContention { .. })
        )
    }

    /// True when a save left some but not all of its entries behind.
    pub fn is_partial_save(&self) -> bool {
        matches!(self, EngineError::PartialSave { .. })
    }
}
