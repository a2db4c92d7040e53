//! Floating-point adder with contention-adaptive striping.
//!
//! [`DoubleAdder`] shares the striped core with
//! [`LongAdder`](super::long_adder::LongAdder); the slots hold the bit patterns
//! of `f64` values instead of integers.

use std::fmt::{self, Debug, Display};

use crate::counters::{debug_words, CounterValue, MetricKind, Observable};
use crate::striped::Striped64;

#[inline]
fn sum_op(a: f64, b: f64) -> f64 {
    a + b
}

/// A high-throughput `f64` running sum.
///
/// Floating-point addition is not associative, so the total of a contended
/// `DoubleAdder` may differ in its last bits depending on how updates were
/// spread over the slots. Integral values within the exact range of `f64`
/// always sum exactly.
///
/// # Examples
///
/// ```rust
/// use sommatori::counters::double_adder::DoubleAdder;
///
/// let seconds = DoubleAdder::new().with_name("busy_seconds");
/// seconds.add(0.25);
/// seconds.add(1.5);
///
/// assert_eq!(seconds.sum(), 1.75);
/// ```
pub struct DoubleAdder {
    name: &'static str,
    striped: Striped64,
}

impl DoubleAdder {
    /// Creates a new adder with a sum of `0.0`.
    pub const fn new() -> Self {
        DoubleAdder {
            name: "",
            striped: Striped64::new(),
        }
    }

    /// Sets the name of this adder, returning `self` for method chaining.
    pub const fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Caps the number of slots the adder may stripe over.
    pub const fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.striped.set_max_slots(max_slots);
        self
    }

    /// Adds `x` to the sum.
    #[inline]
    pub fn add(&self, x: f64) {
        self.striped.update(x, sum_op);
    }

    /// Returns the current sum.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.striped.fold(sum_op)
    }

    /// Resets the sum to `0.0`.
    ///
    /// Only meaningful when no other thread is updating the adder.
    pub fn reset(&self) {
        self.striped.reset(0.0_f64);
    }

    /// Returns the current sum and resets it to `0.0` in a single traversal.
    pub fn sum_then_reset(&self) -> f64 {
        self.striped.fold_then_reset(0.0_f64, sum_op)
    }

    /// Returns the number of slots currently in use, `0` before any contention.
    pub fn slots(&self) -> usize {
        self.striped.slots()
    }
}

impl Observable for DoubleAdder {
    #[inline]
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn value(&self) -> CounterValue {
        CounterValue::Float(self.sum())
    }

    #[inline]
    fn value_and_reset(&self) -> CounterValue {
        CounterValue::Float(self.sum_then_reset())
    }

    fn metric_kind(&self) -> MetricKind {
        MetricKind::Counter
    }
}

impl Default for DoubleAdder {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DoubleAdder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sum())
    }
}

impl Debug for DoubleAdder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_words(f, self.name, &self.striped, |v: f64| v == 0.0)
    }
}

impl From<&DoubleAdder> for f64 {
    fn from(adder: &DoubleAdder) -> Self {
        adder.sum()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DoubleAdder {
    /// Serializes the current sum as a plain number.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.sum())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DoubleAdder {
    /// Restores an unnamed adder whose base word holds the serialized sum.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let sum = <f64 as serde::Deserialize>::deserialize(deserializer)?;
        Ok(DoubleAdder {
            name: "",
            striped: Striped64::with_base(sum),
        })
    }
}
