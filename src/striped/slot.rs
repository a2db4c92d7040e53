//! A single cache-line padded storage location of the striped table.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// One independently updatable 64-bit word of a [`Striped64`](super::Striped64).
///
/// The value is wrapped in [`CachePadded`] so that adjacent slots never share
/// a cache line. Slots are created on demand, shared by every table generation
/// that contains them, and never removed.
pub(crate) struct Slot {
    value: CachePadded<AtomicU64>,
}

impl Slot {
    #[inline]
    pub(crate) fn new(word: u64) -> Self {
        Slot {
            value: CachePadded::new(AtomicU64::new(word)),
        }
    }

    /// Replaces the word with `new` if it still holds `expected`.
    ///
    /// Uses a strong compare-and-swap: a failure always means another caller
    /// changed the word, which the update protocol counts as a collision.
    #[inline]
    pub(crate) fn cas(&self, expected: u64, new: u64) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    pub(crate) fn load(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn store(&self, word: u64) {
        self.value.store(word, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn swap(&self, word: u64) -> u64 {
        self.value.swap(word, Ordering::Relaxed)
    }
}

impl Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&self.load()).finish()
    }
}
