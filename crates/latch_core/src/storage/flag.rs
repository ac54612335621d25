//! Atomic dirty flag
//!
//! Used by caches that persist lazily: writers `mark()` the flag, and the
//! saving job only proceeds if its `take()` observed the dirty state.
//!
//! ```ignore
//! if cache.dirty.take() {
//!     cache.save_to_disk()?;
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct DirtyFlag {
    dirty: AtomicBool,
}

impl DirtyFlag {
    pub const fn new() -> Self {
        Self {
            dirty: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn mark(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Swap `true` to `false`. Returns true only for the caller that made
    /// the transition.
    #[inline]
    pub fn take(&self) -> bool {
        self.dirty
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
