//! The striped, contention-adaptive accumulation core.
//!
//! [`Striped64`] folds values into a running total that many threads can update
//! concurrently. While no contention has ever been observed every update is a
//! single compare-and-swap on the `base` word. The first failed CAS materializes
//! a table of cache-line padded slots; from then on each thread updates the slot
//! selected by its per-thread probe hash, and the table doubles whenever threads
//! keep colliding, up to the platform parallelism.
//!
//! ```text
//!                    ┌─────────────────────────────────────────┐
//!                    │               Striped64                 │
//!                    ├─────────────────────────────────────────┤
//!   no contention ─► │ base   ████████ (CachePadded)           │
//!                    │ busy   ▢ structural spinlock            │
//!                    │ table  ──► [Slot 0] [ --- ] ... [Slot n]│
//!                    └─────────────────────────────────────────┘
//!                                       ▲
//!   Thread A (probe & (n-1)) ───────────┘  writes its own slot
//! ```
//!
//! # Update protocol
//!
//! [`Striped64::update`] runs the fast path (one CAS on `base` or on the
//! caller's slot) and falls back to [`Striped64::combine`] when that CAS fails
//! or does not apply. `combine` loops over the following decisions, in order:
//!
//! 1. the caller's slot is empty: install a new slot under the `busy` flag
//!    (check, lock, recheck);
//! 2. the fast path already failed on this slot: rehash before retrying;
//! 3. CAS into the slot;
//! 4. the table is at its cap or was replaced meanwhile: rehash;
//! 5. first collision: remember it and rehash;
//! 6. second collision in a row: double the table under the `busy` flag.
//!
//! Without a table the caller either creates a two-slot table under the flag
//! or, when the flag is taken, falls back to a CAS on `base`.
//!
//! The `busy` flag is never waited on: a caller that cannot take it picks a
//! different branch on the next turn of the loop.
//!
//! # Combining operators
//!
//! Operators must be commutative and associative. Updates are merged in an
//! order decided by CAS races, and reads fold `base` and the slots in table
//! order, so a non-commutative operator yields an unspecified total.

mod busy;
mod probe;
mod slot;

use std::fmt::{self, Debug};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use crossbeam_utils::CachePadded;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use busy::Busy;
use slot::Slot;

/// A value that can live in a 64-bit slot.
///
/// Implementations reinterpret the value as raw bits, so integer and
/// floating-point accumulators share the same storage and control flow.
pub trait Word: Copy {
    /// Returns the raw 64-bit representation of `self`.
    fn into_word(self) -> u64;

    /// Rebuilds a value from its raw 64-bit representation.
    fn from_word(word: u64) -> Self;
}

impl Word for u64 {
    #[inline]
    fn into_word(self) -> u64 {
        self
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        word
    }
}

impl Word for i64 {
    #[inline]
    fn into_word(self) -> u64 {
        bytemuck::cast(self)
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        bytemuck::cast(word)
    }
}

impl Word for f64 {
    #[inline]
    fn into_word(self) -> u64 {
        bytemuck::cast(self)
    }

    #[inline]
    fn from_word(word: u64) -> Self {
        bytemuck::cast(word)
    }
}

/// Smallest power of two not below the number of available CPUs.
///
/// `available_parallelism` is slow, so the value is computed once per process.
fn parallelism() -> usize {
    static NCPU: OnceLock<usize> = OnceLock::new();
    *NCPU.get_or_init(|| {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
            .next_power_of_two()
    })
}

#[inline]
fn apply<T, F>(op: &F, word: u64, x: T) -> u64
where
    T: Word,
    F: Fn(T, T) -> T,
{
    op(T::from_word(word), x).into_word()
}

/// Returns the caller's probe, seeding it on first use.
///
/// Unhashed threads all land on slot 0, so a collision there says nothing
/// about the table size: a freshly seeded call always counts as uncontended.
fn entry_probe(was_uncontended: bool) -> (u32, bool) {
    match probe::current() {
        0 => (probe::init(), true),
        h => (h, was_uncontended),
    }
}

/// A power-of-two array of lazily installed slots.
struct Table {
    slots: Box<[OnceLock<Arc<Slot>>]>,
}

impl Table {
    fn empty(len: usize) -> Result<Vec<OnceLock<Arc<Slot>>>> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(len)
            .map_err(|source| Error::TableAllocation { len, source })?;
        slots.resize_with(len, OnceLock::new);
        Ok(slots)
    }

    /// The first table: two positions, `word` placed at `probe & 1`.
    fn first(probe: u32, word: u64) -> Result<Self> {
        let slots = Self::empty(2)?;
        let table = Table {
            slots: slots.into_boxed_slice(),
        };
        table.install(probe, Arc::new(Slot::new(word)));
        Ok(table)
    }

    /// A table of twice the length sharing every slot of `self` in its lower half.
    fn doubled(&self) -> Result<Self> {
        let mut slots = Self::empty(self.len() << 1)?;
        for (new, old) in slots.iter_mut().zip(self.slots.iter()) {
            if let Some(slot) = old.get() {
                *new = OnceLock::from(Arc::clone(slot));
            }
        }
        Ok(Table {
            slots: slots.into_boxed_slice(),
        })
    }

    #[inline]
    fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn index(&self, probe: u32) -> usize {
        probe as usize & (self.slots.len() - 1)
    }

    #[inline]
    fn slot(&self, probe: u32) -> Option<&Arc<Slot>> {
        self.slots[self.index(probe)].get()
    }

    /// Installs `slot` at the probe's position unless it is already taken.
    fn install(&self, probe: u32, slot: Arc<Slot>) -> bool {
        self.slots[self.index(probe)].set(slot).is_ok()
    }

    fn present(&self) -> impl Iterator<Item = (usize, &Slot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.get().map(|slot| (i, slot.as_ref())))
    }
}

/// Outcome of one turn of the [`Striped64::combine`] loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The value was folded in.
    Done,
    /// Try again with the same probe.
    Retry,
    /// Advance the probe, then try again.
    Rehash,
}

/// Per-call contention state of the slow path.
#[derive(Debug, Clone, Copy)]
struct Contention {
    /// `false` while the fast-path CAS failure on this slot is still unanswered.
    was_uncontended: bool,
    /// A real collision was observed on the previous turn.
    collide: bool,
}

/// A contention-adaptive striped 64-bit accumulator.
///
/// This is the shared engine behind [`LongAdder`](crate::counters::long_adder::LongAdder),
/// [`DoubleAdder`](crate::counters::double_adder::DoubleAdder) and the accumulator
/// types. It stores raw 64-bit words; the [`Word`] trait converts them to and
/// from the typed values the operators work on.
///
/// # Examples
///
/// ```rust
/// use sommatori::striped::Striped64;
///
/// let total = Striped64::new();
/// total.update(5_i64, i64::wrapping_add);
/// total.update(-2_i64, i64::wrapping_add);
///
/// assert_eq!(total.fold(i64::wrapping_add), 3);
/// ```
pub struct Striped64 {
    base: CachePadded<AtomicU64>,
    table: ArcSwapOption<Table>,
    busy: Busy,
    max_slots: usize,
}

impl Striped64 {
    /// Creates an accumulator with a zero base word and no table.
    pub const fn new() -> Self {
        Self::from_word(0)
    }

    /// Creates an accumulator whose base word holds the raw `word`.
    pub const fn from_word(word: u64) -> Self {
        Striped64 {
            base: CachePadded::new(AtomicU64::new(word)),
            table: ArcSwapOption::const_empty(),
            busy: Busy::new(),
            max_slots: 0,
        }
    }

    /// Creates an accumulator whose base word holds `value`.
    pub fn with_base<T: Word>(value: T) -> Self {
        Self::from_word(value.into_word())
    }

    /// Caps the table at `max_slots` slots, rounded up to a power of two.
    ///
    /// Once striping starts the table holds at least two slots, so caps below
    /// two behave like two. Without a cap the table grows up to the smallest
    /// power of two not below the number of CPUs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::striped::Striped64;
    ///
    /// let total = Striped64::new().with_max_slots(6);
    /// assert_eq!(total.max_slots(), 8);
    /// ```
    pub const fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.set_max_slots(max_slots);
        self
    }

    /// In-place form of [`with_max_slots`](Self::with_max_slots), for the
    /// `const` builders of the counter types.
    pub(crate) const fn set_max_slots(&mut self, max_slots: usize) {
        self.max_slots = if max_slots < 2 {
            2
        } else {
            max_slots.next_power_of_two()
        };
    }

    /// The length the table may grow to.
    pub fn max_slots(&self) -> usize {
        if self.max_slots == 0 {
            parallelism()
        } else {
            self.max_slots
        }
    }

    /// Current table length, `0` while no table exists.
    pub fn slots(&self) -> usize {
        (*self.table.load()).as_ref().map_or(0, |table| table.len())
    }

    /// Returns the raw base word reinterpreted as `T`.
    pub fn base<T: Word>(&self) -> T {
        T::from_word(self.base.load(Ordering::Relaxed))
    }

    #[inline]
    fn cas_base(&self, expected: u64, new: u64) -> bool {
        self.base
            .compare_exchange(expected, new, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }

    #[inline]
    fn is_current(&self, table: &Arc<Table>) -> bool {
        match &*self.table.load() {
            Some(current) => Arc::ptr_eq(current, table),
            None => false,
        }
    }

    /// Folds `x` into the total with `op`.
    ///
    /// Tries a single CAS on the base word (no table yet) or on the caller's
    /// slot, and hands over to [`combine`](Self::combine) if that fails. An
    /// update that leaves the stored word unchanged is complete without a CAS.
    #[inline]
    pub fn update<T, F>(&self, x: T, op: F)
    where
        T: Word,
        F: Fn(T, T) -> T,
    {
        let was_uncontended = {
            let table = self.table.load();
            match &*table {
                None => {
                    let b = self.base.load(Ordering::Relaxed);
                    let r = apply(&op, b, x);
                    if r == b || self.cas_base(b, r) {
                        return;
                    }
                    true
                }
                Some(table) => match table.slot(probe::current()) {
                    None => true,
                    Some(slot) => {
                        let v = slot.load();
                        let r = apply(&op, v, x);
                        if r == v || slot.cas(v, r) {
                            return;
                        }
                        false
                    }
                },
            }
        };
        self.combine(x, op, was_uncontended);
    }

    /// Slow path: folds `x` into the total, retrying until it lands somewhere.
    ///
    /// `was_uncontended` is `false` when the caller's fast-path CAS on its
    /// slot has just failed. The loop may install a slot, create or double the
    /// table, move the caller to another slot, or fall back to the base word.
    pub fn combine<T, F>(&self, x: T, op: F, was_uncontended: bool)
    where
        T: Word,
        F: Fn(T, T) -> T,
    {
        let seed = x.into_word();
        let fold = |word: u64| apply(&op, word, x);

        let (mut h, was_uncontended) = entry_probe(was_uncontended);
        let mut state = Contention {
            was_uncontended,
            collide: false,
        };

        loop {
            let table = self.table.load();
            let step = match &*table {
                Some(table) => self.step_striped(table, h, seed, &fold, &mut state),
                None => self.step_unstriped(h, seed, &fold),
            };
            match step {
                Step::Done => return,
                Step::Retry => {}
                Step::Rehash => h = probe::advance(h),
            }
        }
    }

    fn step_striped(
        &self,
        table: &Arc<Table>,
        h: u32,
        seed: u64,
        fold: &impl Fn(u64) -> u64,
        state: &mut Contention,
    ) -> Step {
        let Some(slot) = table.slot(h) else {
            return self.attach(h, seed, state);
        };

        if !state.was_uncontended {
            state.was_uncontended = true;
            return Step::Rehash;
        }

        let v = slot.load();
        if slot.cas(v, fold(v)) {
            return Step::Done;
        }

        self.on_collision(table, state)
    }

    /// Decides what a failed CAS on an occupied slot calls for: rehash when
    /// growing cannot help, rehash on a first collision, grow on the second.
    fn on_collision(&self, table: &Arc<Table>, state: &mut Contention) -> Step {
        if table.len() >= self.max_slots() || !self.is_current(table) {
            state.collide = false;
            return Step::Rehash;
        }

        if !state.collide {
            state.collide = true;
            return Step::Rehash;
        }

        match self.busy.try_lock() {
            Some(_guard) => {
                if self.is_current(table) {
                    self.grow(table);
                }
                state.collide = false;
                Step::Retry
            }
            None => Step::Rehash,
        }
    }

    /// Installs a fresh slot holding `seed` at the caller's empty position.
    fn attach(&self, h: u32, seed: u64, state: &mut Contention) -> Step {
        if self.busy.is_free() {
            let slot = Arc::new(Slot::new(seed));
            if let Some(_guard) = self.busy.try_lock() {
                let installed = match &*self.table.load() {
                    Some(current) => current.install(h, slot),
                    None => false,
                };
                return if installed { Step::Done } else { Step::Retry };
            }
        }
        state.collide = false;
        Step::Rehash
    }

    fn step_unstriped(&self, h: u32, seed: u64, fold: &impl Fn(u64) -> u64) -> Step {
        if self.busy.is_free() && self.table.load().is_none() {
            if let Some(_guard) = self.busy.try_lock() {
                if self.table.load().is_some() {
                    return Step::Retry;
                }
                match Table::first(h, seed) {
                    Ok(table) => {
                        self.table.store(Some(Arc::new(table)));
                        trace!(slots = 2, "striped table initialized");
                        return Step::Done;
                    }
                    Err(err) => warn!(%err, "keeping base word only"),
                }
            }
        }

        let b = self.base.load(Ordering::Relaxed);
        if self.cas_base(b, fold(b)) {
            Step::Done
        } else {
            Step::Retry
        }
    }

    /// Replaces `table` with one twice as long. Caller holds the busy flag.
    fn grow(&self, table: &Table) {
        match table.doubled() {
            Ok(doubled) => {
                let to = doubled.len();
                self.table.store(Some(Arc::new(doubled)));
                trace!(from = table.len(), to, "striped table grown");
            }
            Err(err) => warn!(%err, "keeping current striped table"),
        }
    }

    /// Folds the base word and every present slot with `op`, base first.
    ///
    /// The traversal is not atomic: it is exact only when no other thread is
    /// updating.
    pub fn fold<T, F>(&self, op: F) -> T
    where
        T: Word,
        F: Fn(T, T) -> T,
    {
        let mut acc = T::from_word(self.base.load(Ordering::Relaxed));
        if let Some(table) = &*self.table.load() {
            for (_, slot) in table.present() {
                acc = op(acc, T::from_word(slot.load()));
            }
        }
        acc
    }

    /// Sets the base word and every present slot to `identity`.
    ///
    /// Only meaningful when no other thread is updating.
    pub fn reset<T: Word>(&self, identity: T) {
        let word = identity.into_word();
        self.base.store(word, Ordering::Relaxed);
        if let Some(table) = &*self.table.load() {
            for (_, slot) in table.present() {
                slot.store(word);
            }
        }
    }

    /// Like [`fold`](Self::fold), swapping each word with `identity` as it is read.
    ///
    /// Concurrent updates land either in the returned value or in the total
    /// left behind, but the split between the two is unspecified.
    pub fn fold_then_reset<T, F>(&self, identity: T, op: F) -> T
    where
        T: Word,
        F: Fn(T, T) -> T,
    {
        let word = identity.into_word();
        let mut acc = T::from_word(self.base.swap(word, Ordering::Relaxed));
        if let Some(table) = &*self.table.load() {
            for (_, slot) in table.present() {
                acc = op(acc, T::from_word(slot.swap(word)));
            }
        }
        acc
    }

    /// Calls `f` with the index and raw word of every present slot.
    pub(crate) fn for_each_slot(&self, mut f: impl FnMut(usize, u64)) {
        if let Some(table) = &*self.table.load() {
            for (i, slot) in table.present() {
                f(i, slot.load());
            }
        }
    }
}

impl Default for Striped64 {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Striped64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Striped64")
            .field("base", &self.base.load(Ordering::Relaxed))
            .field("slots", &self.slots())
            .field("busy", &self.busy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    fn add(a: i64, b: i64) -> i64 {
        a.wrapping_add(b)
    }

    #[test]
    fn test_new_is_unstriped() {
        let striped = Striped64::new();
        assert_eq!(striped.slots(), 0);
        assert_eq!(striped.fold::<i64, _>(add), 0);
    }

    #[test]
    fn test_sequential_updates_stay_in_base() {
        let striped = Striped64::new();
        striped.update(5, add);
        striped.update(-2, add);
        assert_eq!(striped.fold::<i64, _>(add), 3);
        assert_eq!(striped.base::<i64>(), 3);
        assert_eq!(striped.slots(), 0);
    }

    #[test]
    fn test_with_base() {
        let striped = Striped64::with_base(-40_i64);
        striped.update(2, add);
        assert_eq!(striped.fold::<i64, _>(add), -38);
    }

    #[test]
    fn test_with_max_slots_rounds_up() {
        assert_eq!(Striped64::new().with_max_slots(0).max_slots(), 2);
        assert_eq!(Striped64::new().with_max_slots(2).max_slots(), 2);
        assert_eq!(Striped64::new().with_max_slots(5).max_slots(), 8);
        assert_eq!(Striped64::new().with_max_slots(16).max_slots(), 16);
    }

    #[test]
    fn test_default_cap_is_parallelism() {
        let cap = Striped64::new().max_slots();
        assert!(cap.is_power_of_two());
        let ncpu = thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1);
        assert!(cap >= ncpu);
    }

    #[test]
    fn test_combine_initializes_table() {
        let striped = Arc::new(Striped64::new());
        let clone = Arc::clone(&striped);
        // A fresh thread has no probe yet.
        thread::spawn(move || clone.combine(7_i64, add, true))
            .join()
            .unwrap();
        assert_eq!(striped.slots(), 2);
        assert_eq!(striped.fold::<i64, _>(add), 7);
        assert_eq!(striped.base::<i64>(), 0);
    }

    #[test]
    fn test_combine_with_table_from_other_thread() {
        let striped = Arc::new(Striped64::new());
        for delta in [3_i64, 4] {
            let clone = Arc::clone(&striped);
            thread::spawn(move || clone.combine(delta, add, true))
                .join()
                .unwrap();
        }
        assert_eq!(striped.slots(), 2);
        assert_eq!(striped.fold::<i64, _>(add), 7);
    }

    #[test]
    fn test_table_first_and_doubled() {
        let first = Table::first(3, 9).unwrap();
        assert_eq!(first.len(), 2);
        assert!(first.slots[0].get().is_none());
        assert_eq!(first.slot(3).map(|s| s.load()), Some(9));

        let doubled = first.doubled().unwrap();
        assert_eq!(doubled.len(), 4);
        assert!(Arc::ptr_eq(
            first.slots[1].get().unwrap(),
            doubled.slots[1].get().unwrap()
        ));
        assert!(doubled.slots[0].get().is_none());
        assert!(doubled.slots[2].get().is_none());
        assert!(doubled.slots[3].get().is_none());
    }

    #[test]
    fn test_install_refuses_occupied_position() {
        let table = Table::first(0, 1).unwrap();
        assert!(!table.install(0, Arc::new(Slot::new(2))));
        assert!(table.install(1, Arc::new(Slot::new(2))));
        assert_eq!(table.present().count(), 2);
    }

    #[test]
    fn test_unchanged_word_skips_cas() {
        let striped = Striped64::with_base(10_i64);
        striped.update(3_i64, i64::max);
        assert_eq!(striped.base::<i64>(), 10);
        striped.update(12_i64, i64::max);
        assert_eq!(striped.base::<i64>(), 12);
    }

    #[test]
    fn test_float_words() {
        let striped = Striped64::new();
        striped.update(1.5_f64, |a, b| a + b);
        striped.update(2.25_f64, |a, b| a + b);
        assert_eq!(striped.fold::<f64, _>(|a, b| a + b), 3.75);
    }

    #[test]
    fn test_reset_and_fold_then_reset() {
        let striped = Arc::new(Striped64::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let striped = Arc::clone(&striped);
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        striped.update(1_i64, add);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(striped.fold_then_reset::<i64, _>(0, add), 40_000);
        assert_eq!(striped.fold::<i64, _>(add), 0);

        striped.update(5_i64, add);
        striped.reset(0_i64);
        assert_eq!(striped.fold::<i64, _>(add), 0);
    }

    #[test]
    fn test_concurrent_conservation() {
        let striped = Arc::new(Striped64::new());
        let handles: Vec<_> = (0..8_i64)
            .map(|t| {
                let striped = Arc::clone(&striped);
                thread::spawn(move || {
                    for i in 0..20_000_i64 {
                        striped.update((i % 7) - t, add);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let per_thread: i64 = (0..20_000_i64).map(|i| i % 7).sum();
        let expected: i64 = (0..8_i64).map(|t| per_thread - 20_000 * t).sum();
        assert_eq!(striped.fold::<i64, _>(add), expected);
        assert_eq!(striped.fold::<i64, _>(add), expected);
    }

    #[test]
    fn test_table_monotonic_and_capped() {
        let striped = Arc::new(Striped64::new().with_max_slots(4));
        let running = Arc::new(AtomicBool::new(true));

        let sampler = {
            let striped = Arc::clone(&striped);
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let mut samples = Vec::new();
                while running.load(Ordering::Relaxed) {
                    samples.push(striped.slots());
                    thread::yield_now();
                }
                samples.push(striped.slots());
                samples
            })
        };

        let writers: Vec<_> = (0..16)
            .map(|_| {
                let striped = Arc::clone(&striped);
                thread::spawn(move || {
                    for _ in 0..50_000 {
                        striped.update(1_i64, add);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        running.store(false, Ordering::Relaxed);
        let samples = sampler.join().unwrap();

        for pair in samples.windows(2) {
            assert!(pair[0] <= pair[1], "table shrank: {:?}", pair);
        }
        for len in &samples {
            assert!(*len == 0 || (len.is_power_of_two() && *len >= 2 && *len <= 4));
        }
        assert_eq!(striped.fold::<i64, _>(add), 16 * 50_000);
    }

    #[test]
    fn test_for_each_slot_visits_present_slots() {
        let striped = Arc::new(Striped64::new());
        let clone = Arc::clone(&striped);
        thread::spawn(move || clone.combine(5_i64, add, true))
            .join()
            .unwrap();

        let mut seen = Vec::new();
        striped.for_each_slot(|i, word| seen.push((i, i64::from_word(word))));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, 5);
    }

    #[test]
    fn test_word_round_trip_special_floats() {
        for value in [0.0_f64, -0.0, f64::INFINITY, f64::MIN_POSITIVE] {
            assert_eq!(f64::from_word(value.into_word()).to_bits(), value.to_bits());
        }
        assert_eq!(i64::from_word((-1_i64).into_word()), -1);
        assert_eq!((-1_i64).into_word(), u64::MAX);
    }

    fn with_first_table(probe: u32, word: u64, max_slots: usize) -> (Striped64, Arc<Table>) {
        let striped = Striped64::new().with_max_slots(max_slots);
        striped
            .table
            .store(Some(Arc::new(Table::first(probe, word).unwrap())));
        let table = striped.table.load_full().unwrap();
        (striped, table)
    }

    fn fresh_state(collide: bool) -> Contention {
        Contention {
            was_uncontended: true,
            collide,
        }
    }

    #[test]
    fn test_unconfirmed_contention_rehashes_before_cas() {
        let (striped, table) = with_first_table(1, 5, 8);
        let fold = |word: u64| apply(&add, word, 3_i64);
        let mut state = Contention {
            was_uncontended: false,
            collide: false,
        };

        let step = striped.step_striped(&table, 1, 3, &fold, &mut state);
        assert_eq!(step, Step::Rehash);
        assert!(state.was_uncontended);
        assert!(!state.collide);
        assert_eq!(table.slot(1).map(|s| s.load()), Some(5));

        // Confirmed on the next turn: the CAS goes through.
        let step = striped.step_striped(&table, 1, 3, &fold, &mut state);
        assert_eq!(step, Step::Done);
        assert_eq!(table.slot(1).map(|s| s.load()), Some(8));
        assert_eq!(striped.slots(), 2);
    }

    #[test]
    fn test_empty_position_is_attached_under_busy() {
        let (striped, table) = with_first_table(1, 5, 8);
        let fold = |word: u64| apply(&add, word, 3_i64);
        let mut state = fresh_state(true);

        {
            let _guard = striped.busy.try_lock().unwrap();
            let step = striped.step_striped(&table, 0, 3, &fold, &mut state);
            assert_eq!(step, Step::Rehash);
            assert!(!state.collide);
            assert!(table.slot(0).is_none());
        }

        let step = striped.step_striped(&table, 0, 3, &fold, &mut state);
        assert_eq!(step, Step::Done);
        assert_eq!(table.slot(0).map(|s| s.load()), Some(3));
        assert_eq!(striped.fold::<i64, _>(add), 8);
    }

    #[test]
    fn test_second_collision_grows_the_table() {
        let (striped, table) = with_first_table(1, 5, 8);
        let mut state = fresh_state(false);

        assert_eq!(striped.on_collision(&table, &mut state), Step::Rehash);
        assert!(state.collide);
        assert_eq!(striped.slots(), 2);

        assert_eq!(striped.on_collision(&table, &mut state), Step::Retry);
        assert!(!state.collide);
        assert_eq!(striped.slots(), 4);
        assert!(striped.busy.is_free());

        let grown = striped.table.load_full().unwrap();
        assert!(Arc::ptr_eq(table.slot(1).unwrap(), grown.slot(1).unwrap()));
        assert!(grown.slot(0).is_none());
        assert!(grown.slot(2).is_none());
        assert!(grown.slot(3).is_none());
    }

    #[test]
    fn test_no_growth_at_cap() {
        let (striped, table) = with_first_table(1, 5, 2);
        let mut state = fresh_state(true);

        assert_eq!(striped.on_collision(&table, &mut state), Step::Rehash);
        assert!(!state.collide);
        assert_eq!(striped.on_collision(&table, &mut state), Step::Rehash);
        assert_eq!(striped.slots(), 2);
    }

    #[test]
    fn test_busy_defers_growth() {
        let (striped, table) = with_first_table(1, 5, 8);
        let mut state = fresh_state(true);

        let guard = striped.busy.try_lock().unwrap();
        assert_eq!(striped.on_collision(&table, &mut state), Step::Rehash);
        assert!(state.collide);
        assert_eq!(striped.slots(), 2);
        drop(guard);

        assert_eq!(striped.on_collision(&table, &mut state), Step::Retry);
        assert_eq!(striped.slots(), 4);
    }

    #[test]
    fn test_grow_doubles_and_shares_slots() {
        let (striped, table) = with_first_table(1, 5, 16);
        {
            let _guard = striped.busy.try_lock().unwrap();
            striped.grow(&table);
        }
        assert_eq!(striped.slots(), 4);
        let grown = striped.table.load_full().unwrap();
        assert!(Arc::ptr_eq(table.slot(1).unwrap(), grown.slot(1).unwrap()));
        assert!(!striped.is_current(&table));
        assert!(striped.is_current(&grown));

        {
            let _guard = striped.busy.try_lock().unwrap();
            striped.grow(&grown);
        }
        assert_eq!(striped.slots(), 8);
        let twice = striped.table.load_full().unwrap();
        assert!(Arc::ptr_eq(table.slot(1).unwrap(), twice.slot(1).unwrap()));
        assert_eq!(striped.fold::<i64, _>(add), 5);
    }

    #[test]
    fn test_stale_table_is_not_grown() {
        let (striped, table) = with_first_table(1, 5, 16);
        {
            let _guard = striped.busy.try_lock().unwrap();
            striped.grow(&table);
        }
        assert_eq!(striped.slots(), 4);

        let mut state = fresh_state(true);
        assert_eq!(striped.on_collision(&table, &mut state), Step::Rehash);
        assert!(!state.collide);
        assert_eq!(striped.slots(), 4);
    }

    #[test]
    fn test_first_use_probe_counts_as_uncontended() {
        thread::spawn(|| {
            let (h, uncontended) = entry_probe(false);
            assert_ne!(h, 0);
            assert!(uncontended);
            assert_eq!(probe::current(), h);

            // Once seeded, the caller's own flag is kept.
            assert_eq!(entry_probe(false), (h, false));
            assert_eq!(entry_probe(true), (h, true));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_first_use_combine_lands_on_seeded_slot() {
        let (striped, table) = with_first_table(0, 5, 8);
        assert!(table.install(1, Arc::new(Slot::new(7))));
        let striped = Arc::new(striped);

        let clone = Arc::clone(&striped);
        let h = thread::spawn(move || {
            clone.combine(3_i64, add, false);
            probe::current()
        })
        .join()
        .unwrap();

        assert_ne!(h, 0);
        let (landed, other) = if h & 1 == 0 { (5, 7) } else { (7, 5) };
        assert_eq!(table.slot(h).map(|s| s.load()), Some(landed + 3));
        assert_eq!(table.slot(h ^ 1).map(|s| s.load()), Some(other));
        assert_eq!(striped.slots(), 2);
    }
}
