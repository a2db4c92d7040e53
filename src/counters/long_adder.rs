//! Signed 64-bit adder with contention-adaptive striping.
//!
//! This module provides [`LongAdder`], the workhorse counter of the crate.
//! While a single thread updates it, every `add` is one compare-and-swap on a
//! single word. As soon as threads start racing, the adder spreads updates over
//! a growing table of cache-line padded slots.

use std::fmt::{self, Debug, Display};

use crate::counters::{debug_words, CounterValue, MetricKind, Observable};
use crate::striped::Striped64;

#[inline]
fn sum_op(a: i64, b: i64) -> i64 {
    a.wrapping_add(b)
}

/// A high-throughput signed counter.
///
/// `LongAdder` keeps a running `i64` total that many threads can update with
/// minimal interference. Overflow wraps around, as two's-complement addition
/// does.
///
/// # Accuracy
///
/// [`sum`](LongAdder::sum) is exact when no other thread is updating the adder.
/// Under concurrent updates it returns a value that reflects some, but not
/// necessarily all, of the in-flight updates.
///
/// # Examples
///
/// ```rust
/// use sommatori::counters::long_adder::LongAdder;
///
/// let requests = LongAdder::new().with_name("requests");
///
/// requests.increment();
/// requests.add(5);
/// requests.decrement();
///
/// assert_eq!(requests.sum(), 5);
/// ```
///
/// Shared across threads:
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
/// use sommatori::counters::long_adder::LongAdder;
///
/// let hits = Arc::new(LongAdder::new());
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let hits = Arc::clone(&hits);
///         thread::spawn(move || {
///             for _ in 0..1000 {
///                 hits.increment();
///             }
///         })
///     })
///     .collect();
///
/// for handle in handles {
///     handle.join().unwrap();
/// }
/// assert_eq!(hits.sum(), 4000);
/// ```
pub struct LongAdder {
    name: &'static str,
    striped: Striped64,
}

impl LongAdder {
    /// Creates a new adder with a zero sum.
    ///
    /// No slot table is allocated until threads actually contend.
    pub const fn new() -> Self {
        LongAdder {
            name: "",
            striped: Striped64::new(),
        }
    }

    /// Sets the name of this adder, returning `self` for method chaining.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::counters::long_adder::LongAdder;
    /// use sommatori::counters::Observable;
    ///
    /// let counter = LongAdder::new().with_name("bytes_in");
    /// assert_eq!(counter.name(), "bytes_in");
    /// ```
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
    pub fn add(&self, x: i64) {
        self.striped.update(x, sum_op);
    }

    /// Equivalent to `add(1)`.
    #[inline]
    pub fn increment(&self) {
        self.add(1);
    }

    /// Equivalent to `add(-1)`.
    #[inline]
    pub fn decrement(&self) {
        self.add(-1);
    }

    /// Returns the current sum.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::counters::long_adder::LongAdder;
    ///
    /// let counter = LongAdder::new();
    /// counter.add(5);
    /// counter.add(-2);
    /// assert_eq!(counter.sum(), 3);
    /// ```
    #[inline]
    pub fn sum(&self) -> i64 {
        self.striped.fold(sum_op)
    }

    /// Resets the sum to zero.
    ///
    /// Only meaningful when no other thread is updating the adder.
    pub fn reset(&self) {
        self.striped.reset(0_i64);
    }

    /// Returns the current sum and resets it to zero in a single traversal.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::counters::long_adder::LongAdder;
    ///
    /// let counter = LongAdder::new();
    /// counter.add(42);
    /// assert_eq!(counter.sum_then_reset(), 42);
    /// assert_eq!(counter.sum(), 0);
    /// ```
    pub fn sum_then_reset(&self) -> i64 {
        self.striped.fold_then_reset(0_i64, sum_op)
    }

    /// Returns the number of slots currently in use, `0` before any contention.
    pub fn slots(&self) -> usize {
        self.striped.slots()
    }
}

impl Observable for LongAdder {
    #[inline]
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn value(&self) -> CounterValue {
        CounterValue::Signed(self.sum())
    }

    #[inline]
    fn value_and_reset(&self) -> CounterValue {
        CounterValue::Signed(self.sum_then_reset())
    }

    fn metric_kind(&self) -> MetricKind {
        MetricKind::Counter
    }
}

impl Default for LongAdder {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for LongAdder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sum())
    }
}

impl Debug for LongAdder {
    /// Formats the adder showing the non-zero base word and slots.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_words(f, self.name, &self.striped, |v: i64| v == 0)
    }
}

impl From<&LongAdder> for i64 {
    fn from(adder: &LongAdder) -> Self {
        adder.sum()
    }
}

impl From<&LongAdder> for f64 {
    fn from(adder: &LongAdder) -> Self {
        adder.sum() as f64
    }
}

impl TryFrom<&LongAdder> for i32 {
    type Error = std::num::TryFromIntError;

    fn try_from(adder: &LongAdder) -> Result<Self, Self::Error> {
        i32::try_from(adder.sum())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for LongAdder {
    /// Serializes the current sum as a plain number.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.sum())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for LongAdder {
    /// Restores an unnamed adder whose base word holds the serialized sum.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let sum = <i64 as serde::Deserialize>::deserialize(deserializer)?;
        Ok(LongAdder {
            name: "",
            striped: Striped64::with_base(sum),
        })
    }
}
