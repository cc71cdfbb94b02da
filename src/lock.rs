// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Advisory locking on top of the backend's named locks.
//!
//! The engine never takes a lock on its own. Callers that need a save to be
//! exclusive against other writers bracket it themselves, either with
//! [`VersionedStore::lock`]/[`VersionedStore::unlock`], with a
//! [`LockGuard`], or with [`VersionedStore::with_lock`].
//!
//! # Example
//!
//! ```no_run
//! use tskv::engine::VersionedStore;
//! use tskv::record::Blob;
//! use tskv::storage::{new_holder_token, MemoryBackend, Session};
//!
//! let session = Session::open(MemoryBackend::new()).unwrap();
//! let store = VersionedStore::with_defaults(&session);
//! let archive = store.archive().clone();
//! let holder = new_holder_token();
//!
//! store
//!     .with_lock("alpha", &holder, |store| {
//!         store.save(&mut Blob::new("alpha", "v1"), &archive, "t1")
//!     })
//!     .unwrap();
//! ```

use tracing::{info, warn};

use crate::engine::{EngineError, VersionedStore};
use crate::storage::Backend;

/// A held lock, released when dropped.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, B: Backend> {
    backend: &'a B,
    name: String,
    holder: String,
    released: bool,
}

impl<'a, B: Backend> LockGuard<'a, B> {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Releases the lock, reporting any backend error.
    pub fn release(mut self) -> Result<(), EngineError> {
        self.released = true;
        self.backend.unlock(&self.name)?;
        info!(name = %self.name, holder = %self.holder, "lock released");
        Ok(())
    }
}

impl<B: Backend> Drop for LockGuard<'_, B> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.backend.unlock(&self.name) {
            warn!(name = %self.name, error = %e, "failed to release lock on drop");
        }
    }
}

impl<'s, B: Backend> VersionedStore<'s, B> {
    /// Acquires the advisory lock `name` for `holder`.
    ///
    /// Fails with a lock-contention error while the lock is held, including
    /// by the same holder.
    pub fn lock(&self, name: &str, holder: &str) -> Result<(), EngineError> {
        match self.backend().lock(name, holder) {
            Ok(()) => {
                info!(name, holder, "lock acquired");
                Ok(())
            }
            Err(e) => {
                warn!(name, holder, error = %e, "lock refused");
                Err(e.into())
            }
        }
    }

    /// Releases the advisory lock `name`. Releasing a free lock succeeds.
    pub fn unlock(&self, name: &str) -> Result<(), EngineError> {
        self.backend().unlock(name)?;
        info!(name, "lock released");
        Ok(())
    }

    /// Acquires `name` and returns a guard that releases it on drop.
    pub fn lock_guard(&self, name: &str, holder: &str) -> Result<LockGuard<'_, B>, EngineError> {
        self.lock(name, holder)?;

        Ok(LockGuard {
            backend: self.backend(),
            name: name.to_string(),
            holder: holder.to_string(),
            released: false,
        })
    }

    /// Runs `f` while holding `name`, releasing it afterwards whatever `f`
    /// returns. An error from `f` takes precedence over a release error.
    pub fn with_lock<T, F>(&self, name: &str, holder: &str, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(&Self) -> Result<T, EngineError>,
    {
        let guard = self.lock_guard(name, holder)?;
        let result = f(self);
        let released = guard.release();

        let value = result?;
        released?;
        Ok(value)
    }
}
