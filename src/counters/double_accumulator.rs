//! Floating-point accumulator over a user-supplied combining function.

use std::fmt::{self, Debug};

use crate::counters::{debug_words, CounterValue, MetricKind, Observable};
use crate::striped::Striped64;

/// A striped `f64` accumulator.
///
/// Same contract as [`LongAccumulator`](super::long_accumulator::LongAccumulator):
/// `op` must be commutative and associative with `identity` as its identity
/// element. Slots store the raw bits of each `f64`.
///
/// # Examples
///
/// ```rust
/// use sommatori::counters::double_accumulator::DoubleAccumulator;
///
/// let hottest = DoubleAccumulator::max();
/// hottest.accumulate(21.5);
/// hottest.accumulate(37.25);
/// hottest.accumulate(-3.0);
///
/// assert_eq!(hottest.get(), 37.25);
/// ```
pub struct DoubleAccumulator {
    name: &'static str,
    op: fn(f64, f64) -> f64,
    identity: f64,
    striped: Striped64,
}

impl DoubleAccumulator {
    /// Creates an accumulator for `op` starting at `identity`.
    pub const fn new(op: fn(f64, f64) -> f64, identity: f64) -> Self {
        DoubleAccumulator {
            name: "",
            op,
            identity,
            striped: Striped64::from_word(identity.to_bits()),
        }
    }

    /// Tracks the maximum accumulated value, starting at negative infinity.
    pub const fn max() -> Self {
        Self::new(f64::max, f64::NEG_INFINITY)
    }

    /// Tracks the minimum accumulated value, starting at positive infinity.
    pub const fn min() -> Self {
        Self::new(f64::min, f64::INFINITY)
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
    pub fn accumulate(&self, x: f64) {
        let op = self.op;
        self.striped.update(op(self.identity, x), op);
    }

    /// Returns the current accumulated value.
    #[inline]
    pub fn get(&self) -> f64 {
        self.striped.fold(self.op)
    }

    /// Resets the accumulated value to the identity.
    pub fn reset(&self) {
        self.striped.reset(self.identity);
    }

    /// Returns the current value and resets to the identity in a single traversal.
    pub fn get_then_reset(&self) -> f64 {
        self.striped.fold_then_reset(self.identity, self.op)
    }

    /// The identity element this accumulator starts from.
    pub fn identity(&self) -> f64 {
        self.identity
    }

    /// Returns the number of slots currently in use, `0` before any contention.
    pub fn slots(&self) -> usize {
        self.striped.slots()
    }
}

impl Observable for DoubleAccumulator {
    fn name(&self) -> &str {
        self.name
    }

    fn value(&self) -> CounterValue {
        CounterValue::Float(self.get())
    }

    fn value_and_reset(&self) -> CounterValue {
        CounterValue::Float(self.get_then_reset())
    }

    fn metric_kind(&self) -> MetricKind {
        MetricKind::Gauge
    }
}

impl Debug for DoubleAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let identity = self.identity.to_bits();
        debug_words(f, self.name, &self.striped, |v: f64| v.to_bits() == identity)
    }
}
