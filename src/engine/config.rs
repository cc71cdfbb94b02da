// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the versioning engine.

use crate::tree::Tree;

/// Default namespace holding tag-addressed history.
pub const DEFAULT_ARCHIVE_NAMESPACE: &str = "archive";

/// Which copies a rollback rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Re-save through the full dual write, so the live mirror also
    /// returns the rolled-back content.
    #[default]
    RefreshLive,
    /// Write only the namespaced history; the live mirror keeps its content.
    ArchiveOnly,
}

/// Configuration for [`VersionedStore`](super::VersionedStore).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Namespace callers use for history when they have no other.
    pub archive: Tree,
    /// Rollback behavior for the live mirror.
    pub rollback_policy: RollbackPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            archive: Tree::new([DEFAULT_ARCHIVE_NAMESPACE]),
            rollback_policy: RollbackPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the archive namespace.
    pub fn with_archive(mut self, archive: Tree) -> Self {
        self.archive = archive;
        self
    }

    /// Sets the rollback policy.
    pub fn with_rollback_policy(mut self, policy: RollbackPolicy) -> Self {
        self.rollback_policy = policy;
        self
    }
}
