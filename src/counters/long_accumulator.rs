//! Integer accumulator over a user-supplied combining function.
//!
//! [`LongAccumulator`] generalizes [`LongAdder`](super::long_adder::LongAdder)
//! to any commutative, associative operator with an identity element, such as
//! `max`, `min` or bitwise `or`.

use std::fmt::{self, Debug};

use crate::counters::{debug_words, CounterValue, MetricKind, Observable};
use crate::striped::Striped64;

/// A striped `i64` accumulator.
///
/// The operator must be commutative and associative, and `identity` must be
/// its identity element (`op(identity, x) == x`). Other operators are not
/// detected and yield an unspecified result, because updates are merged in an
/// order decided by thread races.
///
/// # Examples
///
/// ```rust
/// use sommatori::counters::long_accumulator::LongAccumulator;
///
/// let peak = LongAccumulator::max().with_name("queue_depth_max");
/// peak.accumulate(12);
/// peak.accumulate(40);
/// peak.accumulate(7);
///
/// assert_eq!(peak.get(), 40);
/// ```
///
/// A custom operator:
///
/// ```rust
/// use sommatori::counters::long_accumulator::LongAccumulator;
///
/// let flags = LongAccumulator::new(|a, b| a | b, 0);
/// flags.accumulate(0b001);
/// flags.accumulate(0b100);
/// assert_eq!(flags.get(), 0b101);
/// ```
pub struct LongAccumulator {
    name: &'static str,
    op: fn(i64, i64) -> i64,
    identity: i64,
    striped: Striped64,
}

impl LongAccumulator {
    /// Creates an accumulator for `op` starting at `identity`.
    pub const fn new(op: fn(i64, i64) -> i64, identity: i64) -> Self {
        LongAccumulator {
            name: "",
            op,
            identity,
            striped: Striped64::from_word(identity as u64),
        }
    }

    /// Tracks the maximum accumulated value, starting at `i64::MIN`.
    pub const fn max() -> Self {
        Self::new(i64::max, i64::MIN)
    }

    /// Tracks the minimum accumulated value, starting at `i64::MAX`.
    pub const fn min() -> Self {
        Self::new(i64::min, i64::MAX)
    }

    /// Sets the name of this accumulator, returning `self` for method chaining.
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Caps the number of slots the accumulator may stripe over.
    pub const fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.striped.set_max_slots(max_slots);
        self
    }

    /// Folds `x` into the accumulated value.
    #[inline]
    pub fn accumulate(&self, x: i64) {
        let op = self.op;
        self.striped.update(op(self.identity, x), op);
    }

    /// Returns the current accumulated value.
    ///
    /// Exact only when no other thread is accumulating at the same time.
    #[inline]
    pub fn get(&self) -> i64 {
        self.striped.fold(self.op)
    }

    /// Resets the accumulated value to the identity.
    ///
    /// Only meaningful when no other thread is accumulating.
    pub fn reset(&self) {
        self.striped.reset(self.identity);
    }

    /// Returns the current value and resets to the identity in a single traversal.
    pub fn get_then_reset(&self) -> i64 {
        self.striped.fold_then_reset(self.identity, self.op)
    }

    /// The identity element this accumulator starts from.
    pub fn identity(&self) -> i64 {
        self.identity
    }

    /// Returns the number of slots currently in use, `0` before any contention.
    pub fn slots(&self) -> usize {
        self.striped.slots()
    }
}

impl Observable for LongAccumulator {
    #[inline]
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn value(&self) -> CounterValue {
        CounterValue::Signed(self.get())
    }

    #[inline]
    fn value_and_reset(&self) -> CounterValue {
        CounterValue::Signed(self.get_then_reset())
    }

    fn metric_kind(&self) -> MetricKind {
        MetricKind::Gauge
    }
}

impl Debug for LongAccumulator {
    /// Formats the accumulator showing the words that differ from the identity.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = self.identity;
        debug_words(f, self.name, &self.striped, |v: i64| v == identity)
    }
}
