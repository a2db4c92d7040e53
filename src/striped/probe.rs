//! Per-thread probe hash used to pick a slot of the striped table.
//!
//! Every thread owns a 32-bit probe. It starts at `0` ("unset"), is seeded on
//! the first contended update, and is advanced with a xorshift step each time
//! the thread's current slot turns out to be contended. Because the probe is
//! thread-local no synchronization is needed to read or advance it.

use std::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};

/// Weyl-sequence increment used to spread seeds across threads.
const SEED_INCREMENT: u32 = 0x9e37_79b9;

/// Process-wide seed generator.
static NEXT_SEED: AtomicU32 = AtomicU32::new(0);

thread_local! {
    /// Probe of the current thread, `0` until first initialized.
    static PROBE: Cell<u32> = const { Cell::new(0) };
}

/// Returns the current thread's probe, or `0` if it was never initialized.
#[inline]
pub(crate) fn current() -> u32 {
    PROBE.with(Cell::get)
}

/// Seeds the current thread's probe and returns it.
///
/// The returned value is never `0`.
pub(crate) fn init() -> u32 {
    let mut seed = NEXT_SEED
        .fetch_add(SEED_INCREMENT, Ordering::Relaxed)
        .wrapping_add(SEED_INCREMENT);
    if seed == 0 {
        seed = 1;
    }
    PROBE.with(|probe| probe.set(seed));
    seed
}

/// Advances the current thread's probe by one xorshift step and returns it.
#[inline]
pub(crate) fn advance(probe: u32) -> u32 {
    let next = xorshift(probe);
    PROBE.with(|p| p.set(next));
    next
}

/// Marsaglia xorshift (13, 17, 5). Maps non-zero values to non-zero values.
#[inline]
pub(crate) const fn xorshift(mut h: u32) -> u32 {
    h ^= h << 13;
    h ^= h >> 17;
    h ^= h << 5;
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_unset_on_new_thread() {
        let probe = thread::spawn(current).join().unwrap();
        assert_eq!(probe, 0);
    }

    #[test]
    fn test_init_is_non_zero_and_sticky() {
        thread::spawn(|| {
            let seed = init();
            assert_ne!(seed, 0);
            assert_eq!(current(), seed);
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_seeds_differ_between_threads() {
        let a = thread::spawn(init).join().unwrap();
        let b = thread::spawn(init).join().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_xorshift_known_values() {
        assert_eq!(xorshift(1), 270369);
        assert_eq!(xorshift(0), 0);
    }

    #[test]
    fn test_advance_updates_thread_probe() {
        thread::spawn(|| {
            let seed = init();
            let next = advance(seed);
            assert_eq!(next, xorshift(seed));
            assert_eq!(current(), next);
            assert_ne!(next, 0);
        })
        .join()
        .unwrap();
    }
}
