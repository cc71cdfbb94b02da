// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! The versioning engine.

use tracing::{debug, info, instrument, warn};

use crate::record::VersionedRecord;
use crate::storage::{Backend, Session};
use crate::tree::{join_path, Tree, SEPARATOR};

use super::config::{EngineConfig, RollbackPolicy};
use super::error::EngineError;
use super::tag::{is_valid_tag, TagClock, LATEST};

/// Versioned key-value store over an open backend session.
///
/// Holds no durable state of its own: every operation is translated into
/// primitive backend calls against these addresses:
///
/// - `<namespace>/<key>/<tag>` and `<namespace>/<key>/latest`: history
/// - `<key>/<tag>` and `<key>/latest`: the namespace-free live mirror
///
/// Writing a tag in a scope always rewrites `latest` in that scope too.
pub struct VersionedStore<'s, B: Backend> {
    session: &'s Session<B>,
    config: EngineConfig,
    clock: TagClock,
}

impl<'s, B: Backend> VersionedStore<'s, B> {
    /// Creates a store on `session`.
    pub fn new(session: &'s Session<B>, config: EngineConfig) -> Self {
        Self {
            session,
            config,
            clock: TagClock::new(),
        }
    }

    /// Creates a store with the default configuration.
    pub fn with_defaults(session: &'s Session<B>) -> Self {
        Self::new(session, EngineConfig::default())
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The configured archive namespace.
    #[inline]
    pub fn archive(&self) -> &Tree {
        &self.config.archive
    }

    #[inline]
    pub(crate) fn backend(&self) -> &B {
        self.session.backend()
    }

    /// Returns a fresh timestamp tag, later than any this store handed out.
    pub fn next_tag(&self) -> String {
        self.clock.next_tag()
    }

    /// Saves `record` under `tag`, both in `tree` and in the live mirror.
    ///
    /// Up to four sequential, non-atomic writes: the tag and `latest` in
    /// `tree`, then the tag and `latest` in the live mirror. A failure on
    /// the first write is returned as [`EngineError::Storage`] and leaves
    /// nothing behind. A failure on any later write is returned as
    /// [`EngineError::PartialSave`], naming the entries that did land.
    /// Callers needing exclusion against other writers wrap the call in a
    /// lock.
    #[instrument(skip(self, record, tree), fields(key = record.key(), tree = %tree))]
    pub fn save<R: VersionedRecord>(
        &self,
        record: &mut R,
        tree: &Tree,
        tag: &str,
    ) -> Result<(), EngineError> {
        validate(&*record, tag)?;
        let bytes = record.marshal()?;

        let mut written = Vec::with_capacity(4);
        self.write_tagged(&*record, &bytes, Some(tree), tag, &mut written)?;
        self.write_tagged(&*record, &bytes, None, tag, &mut written)?;

        record.save_id(tag);
        info!(
            tag,
            bytes = bytes.len(),
            compressed = record.is_compressed(),
            "saved version"
        );
        Ok(())
    }

    /// Reads the latest content of `record` from `tree`, or from the live
    /// mirror when `tree` is `None`.
    ///
    /// A key that was never written reads as empty content, not an error.
    #[instrument(skip(self, record, tree), fields(key = record.key()))]
    pub fn get<R: VersionedRecord>(
        &self,
        record: &mut R,
        tree: Option<&Tree>,
    ) -> Result<(), EngineError> {
        validate(&*record, LATEST)?;
        let path = entry_path(&*record, tree, LATEST);

        match self.backend().get_key(&path)? {
            Some(bytes) => {
                debug!(path = %path, bytes = bytes.len(), "read latest");
                record.unmarshal(bytes)?;
                record.save_id(LATEST);
            }
            None => {
                debug!(path = %path, "no entry, reading as empty");
                record.unmarshal(Vec::new())?;
            }
        }
        Ok(())
    }

    /// Reads the content saved under exactly `tag` in `tree`.
    ///
    /// Fails with [`EngineError::NotFound`] if that tag was never written,
    /// which is distinct from a tag written with empty content.
    #[instrument(skip(self, record, tree), fields(key = record.key(), tree = %tree))]
    pub fn get_version<R: VersionedRecord>(
        &self,
        record: &mut R,
        tree: &Tree,
        tag: &str,
    ) -> Result<(), EngineError> {
        validate(&*record, tag)?;
        let path = entry_path(&*record, Some(tree), tag);

        let bytes = self
            .backend()
            .get_key(&path)?
            .ok_or_else(|| EngineError::NotFound {
                path: path.clone(),
                tag: tag.to_string(),
            })?;

        debug!(path = %path, bytes = bytes.len(), "read version");
        record.unmarshal(bytes)?;
        record.save_id(tag);
        Ok(())
    }

    /// Lists every tag written for `record` in `tree`, `latest` included.
    ///
    /// Order is the backend's listing order. Entries belonging to keys
    /// nested beneath this one are not tags and are skipped.
    #[instrument(skip(self, record, tree), fields(key = record.key(), tree = %tree))]
    pub fn get_versions<R: VersionedRecord>(
        &self,
        record: &R,
        tree: &Tree,
    ) -> Result<Vec<String>, EngineError> {
        validate(record, LATEST)?;
        let mut prefix = record.make_path(Some(tree));
        prefix.push(SEPARATOR);

        let tags: Vec<String> = self
            .backend()
            .get_keys(&prefix, Some(SEPARATOR))?
            .into_iter()
            .filter_map(|key| {
                let tag = key.strip_prefix(prefix.as_str())?;
                is_valid_tag(tag).then(|| tag.to_string())
            })
            .collect();

        debug!(prefix = %prefix, count = tags.len(), "listed versions");
        Ok(tags)
    }

    /// Re-saves the content of `tag` as a brand-new version.
    ///
    /// Later versions are never touched; history stays append-only. Whether
    /// the live mirror is rewritten follows [`RollbackPolicy`]. Returns the
    /// new tag, which is also handed to the record.
    #[instrument(skip(self, record, tree), fields(key = record.key(), tree = %tree))]
    pub fn rollback<R: VersionedRecord>(
        &self,
        record: &mut R,
        tree: &Tree,
        tag: &str,
    ) -> Result<String, EngineError> {
        self.get_version(record, tree, tag)?;
        let new_tag = self.next_tag();

        match self.config.rollback_policy {
            RollbackPolicy::RefreshLive => self.save(record, tree, &new_tag)?,
            RollbackPolicy::ArchiveOnly => {
                let bytes = record.marshal()?;
                let mut written = Vec::with_capacity(2);
                self.write_tagged(&*record, &bytes, Some(tree), &new_tag, &mut written)?;
                record.save_id(&new_tag);
            }
        }

        info!(from = tag, to = %new_tag, policy = ?self.config.rollback_policy, "rolled back");
        Ok(new_tag)
    }

    /// Writes `<scope>/<key>/<tag>`, then `<scope>/<key>/latest`, pushing
    /// each address onto `written` once it lands.
    ///
    /// `written` carries the entries of earlier scopes of the same save, so a
    /// failure is partial whenever anything at all was written before it.
    fn write_tagged<R: VersionedRecord>(
        &self,
        record: &R,
        bytes: &[u8],
        tree: Option<&Tree>,
        tag: &str,
        written: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        let mut paths = vec![entry_path(record, tree, tag)];
        if tag != LATEST {
            paths.push(entry_path(record, tree, LATEST));
        }

        for path in paths {
            if let Err(source) = self.backend().save_key(&path, bytes) {
                if written.is_empty() {
                    return Err(source.into());
                }
                warn!(
                    written = ?written,
                    failed = %path,
                    error = %source,
                    "save left partial entries"
                );
                return Err(EngineError::PartialSave {
                    written: std::mem::take(written),
                    failed: path,
                    source,
                });
            }
            debug!(path = %path, "wrote entry");
            written.push(path);
        }
        Ok(())
    }
}

/// Address of `tag` for `record` in the given scope.
fn entry_path<R: VersionedRecord + ?Sized>(record: &R, tree: Option<&Tree>, tag: &str) -> String {
    join_path([record.make_path(tree).as_str(), tag])
}

fn validate<R: VersionedRecord + ?Sized>(record: &R, tag: &str) -> Result<(), EngineError> {
    if join_path([record.key()]).is_empty() {
        return Err(EngineError::InvalidKey(record.key().to_string()));
    }
    if !is_valid_tag(tag) {
        return Err(EngineError::InvalidTag(tag.to_string()));
    }
    Ok(())
}
