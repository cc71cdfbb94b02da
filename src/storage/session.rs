// Copyright 2025 Ojima Abraham
// SPDX-License-Identifier: Apache-2.0

//! Scoped backend session handle.

use tracing::{info, warn};

use super::{Backend, StorageError};

/// An established backend session.
///
/// Opening runs `setup()`; [`close`](Session::close) runs `teardown()` and
/// reports its error. A session dropped without being closed tears down on
/// a best-effort basis and logs any failure.
pub struct Session<B: Backend> {
    backend: B,
    closed: bool,
}

impl<B: Backend> Session<B> {
    /// Establishes a session, failing fast when the backend is unreachable.
    pub fn open(backend: B) -> Result<Self, StorageError> {
        backend.setup()?;
        info!("backend session opened");

        Ok(Self {
            backend,
            closed: false,
        })
    }

    /// The backend this session was established on.
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ends the session.
    pub fn close(mut self) -> Result<(), StorageError> {
        self.closed = true;
        self.backend.teardown()?;
        info!("backend session closed");
        Ok(())
    }
}

impl<B: Backend> Drop for Session<B> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.backend.teardown() {
            warn!(error = %e, "backend teardown failed on drop");
        }
    }
}
