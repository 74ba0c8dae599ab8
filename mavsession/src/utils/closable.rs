//! # Stop flags for runners
//!
//! A [`Closer`] is owned by whoever controls the lifetime of a background task. The task
//! itself holds a read-only [`Closable`] and stops once the closer is closed or dropped.
//!
//! ```rust
//! use mavsession::utils::Closer;
//!
//! let closer = Closer::new();
//! let closable = closer.to_closable();
//! assert!(!closable.is_closed());
//!
//! drop(closer);
//! assert!(closable.is_closed());
//! ```

use std::sync::atomic::{self, AtomicBool};
use std::sync::Arc;

/// Owner side of a stop flag.
///
/// Closed explicitly by [`Closer::close`] or implicitly when dropped. This struct is
/// intentionally not [`Clone`].
#[derive(Debug)]
#[must_use]
pub struct Closer(Arc<AtomicBool>);

impl Closer {
    /// Creates an open closer.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Returns a read-only view of this closer.
    pub fn to_closable(&self) -> Closable {
        Closable(self.0.clone())
    }

    /// Closes the flag for all associated [`Closable`]s.
    pub fn close(&mut self) {
        self.0.store(true, atomic::Ordering::Release);
    }

    /// Returns `true` if closed.
    pub fn is_closed(&self) -> bool {
        self.0.load(atomic::Ordering::Acquire)
    }
}

impl Default for Closer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Closer {
    fn drop(&mut self) {
        self.close()
    }
}

/// Read-only side of a stop flag obtained by [`Closer::to_closable`].
#[derive(Clone, Debug)]
#[must_use]
pub struct Closable(Arc<AtomicBool>);

impl Closable {
    /// Returns `true` if the owning [`Closer`] is closed or gone.
    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.0.load(atomic::Ordering::Acquire)
    }
}
