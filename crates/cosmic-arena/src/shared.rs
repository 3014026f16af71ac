//! Coarse exclusive-lock wrapper for sharing one allocator.
//!
//! [`ArenaAllocator`] has no internal locking: it assumes a single writer.
//! When several producers must feed the same allocator, wrap it in a
//! [`SharedArena`] so every operation runs under one lock. Views and
//! slices never escape the closure passed to [`SharedArena::with`].

use std::sync::{Arc, Mutex, PoisonError};

use crate::allocator::ArenaAllocator;

/// Cloneable handle to an allocator guarded by a single mutex.
#[derive(Clone, Debug)]
pub struct SharedArena {
    inner: Arc<Mutex<ArenaAllocator>>,
}

impl SharedArena {
    /// Take ownership of `arena` behind a lock.
    pub fn new(arena: ArenaAllocator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(arena)),
        }
    }

    /// Run `f` with exclusive access to the allocator.
    ///
    /// A poisoned lock is recovered: the allocator's invariants hold
    /// between individual operations.
    pub fn with<R>(&self, f: impl FnOnce(&mut ArenaAllocator) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl From<ArenaAllocator> for SharedArena {
    fn from(arena: ArenaAllocator) -> Self {
        Self::new(arena)
    }
}
