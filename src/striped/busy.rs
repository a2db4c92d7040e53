//! Non-blocking structural spinlock of the striped table.
//!
//! `Busy` guards every structural change of a [`Striped64`](super::Striped64):
//! creating the table, installing a slot and doubling the table. It never
//! spins: callers that fail to acquire it take another branch of the update
//! protocol instead of waiting.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct Busy {
    held: AtomicBool,
}

/// Releases the [`Busy`] flag when dropped.
pub(crate) struct BusyGuard<'a> {
    busy: &'a Busy,
}

impl Busy {
    pub(crate) const fn new() -> Self {
        Busy {
            held: AtomicBool::new(false),
        }
    }

    /// Cheap pre-check used before doing optimistic work.
    #[inline]
    pub(crate) fn is_free(&self) -> bool {
        !self.held.load(Ordering::Relaxed)
    }

    /// Attempts to take the flag once; returns `None` if another caller holds it.
    #[inline]
    pub(crate) fn try_lock(&self) -> Option<BusyGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| BusyGuard { busy: self })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.held.store(false, Ordering::Release);
    }
}

impl Debug for Busy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.is_free() { "free" } else { "busy" })
    }
}
