//! Public counter types and the shared reporting interface.
//!
//! Every counter in this module is a thin facade over a
//! [`Striped64`](crate::striped::Striped64): it picks the value type and the
//! combining operator, and exposes reads and resets that traverse the base word
//! plus all slots.
//!
//! | Type | Value | Operator | Use Case |
//! |------|-------|----------|----------|
//! | [`LongAdder`](long_adder::LongAdder) | `i64` | wrapping `+` | Event counts, request totals |
//! | [`DoubleAdder`](double_adder::DoubleAdder) | `f64` | `+` | Byte volumes, accumulated durations |
//! | [`LongAccumulator`](long_accumulator::LongAccumulator) | `i64` | any commutative, associative fn | Maximum latency, bit sets |
//! | [`DoubleAccumulator`](double_accumulator::DoubleAccumulator) | `f64` | any commutative, associative fn | Peak values |
//!
//! All of them implement [`Observable`], so they can be mixed in the same
//! collection and handed to the [adapters](crate::adapters) and
//! [observers](crate::observers).

pub mod double_accumulator;
pub mod double_adder;
pub mod long_accumulator;
pub mod long_adder;

use std::fmt::{self, Debug, Display};

/// Represents the value of a counter.
///
/// This enum allows the [`Observable`] trait to return values from counters
/// of different underlying types through a unified interface.
///
/// # Examples
///
/// ```rust
/// use sommatori::counters::CounterValue;
///
/// let signed = CounterValue::Signed(-10);
/// let float = CounterValue::Float(0.5);
///
/// assert!(!signed.is_zero());
/// assert!(!float.is_zero());
/// assert!(CounterValue::Unsigned(0).is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CounterValue {
    /// An unsigned 64-bit counter value.
    Unsigned(u64),
    /// A signed 64-bit counter value.
    Signed(i64),
    /// A 64-bit floating-point counter value.
    Float(f64),
}

impl Display for CounterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterValue::Unsigned(v) => write!(f, "{}", v),
            CounterValue::Signed(v) => write!(f, "{}", v),
            CounterValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl CounterValue {
    /// Returns `true` if the counter value is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            CounterValue::Unsigned(v) => *v == 0,
            CounterValue::Signed(v) => *v == 0,
            CounterValue::Float(v) => *v == 0.0,
        }
    }

    /// Returns the value as a `u64`.
    ///
    /// Negative integers wrap around; floats saturate and drop the fraction.
    pub fn as_u64(&self) -> u64 {
        match self {
            CounterValue::Unsigned(v) => *v,
            CounterValue::Signed(v) => *v as u64,
            CounterValue::Float(v) => *v as u64,
        }
    }

    /// Returns the value as an `i64`.
    pub fn as_i64(&self) -> i64 {
        match self {
            CounterValue::Unsigned(v) => *v as i64,
            CounterValue::Signed(v) => *v,
            CounterValue::Float(v) => *v as i64,
        }
    }

    /// Returns the value as an `f64`.
    pub fn as_f64(&self) -> f64 {
        match self {
            CounterValue::Unsigned(v) => *v as f64,
            CounterValue::Signed(v) => *v as f64,
            CounterValue::Float(v) => *v,
        }
    }
}

/// How a counter's value evolves, used by observers to pick a metric type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetricKind {
    /// Accumulates a total; reported as a counter.
    #[default]
    Counter,
    /// Tracks a level that can move in any direction; reported as a gauge.
    Gauge,
}

/// A trait for types that can be observed to retrieve their current value.
///
/// # Examples
///
/// ```rust
/// use sommatori::counters::long_adder::LongAdder;
/// use sommatori::counters::{CounterValue, Observable};
///
/// let counter = LongAdder::new().with_name("requests");
/// counter.add(5);
///
/// assert_eq!(counter.name(), "requests");
/// assert_eq!(counter.value(), CounterValue::Signed(5));
/// assert_eq!(counter.value_and_reset(), CounterValue::Signed(5));
/// assert_eq!(counter.value(), CounterValue::Signed(0));
/// ```
pub trait Observable: Debug {
    /// Returns the name of this counter, or an empty string if unnamed.
    fn name(&self) -> &str;

    /// Returns the current aggregated value of the counter.
    ///
    /// Reads the base word and every slot once. The result is exact only if
    /// no other thread is updating the counter at the same time.
    fn value(&self) -> CounterValue;

    /// Returns the current value and resets the counter.
    ///
    /// Each word is reset as it is read, but the traversal as a whole is not
    /// atomic: concurrent updates may end up in either the returned value or
    /// the next one.
    fn value_and_reset(&self) -> CounterValue;

    /// Returns how the value evolves over time.
    fn metric_kind(&self) -> MetricKind {
        MetricKind::Counter
    }
}

impl Display for dyn Observable + '_ {
    /// Formats the counter as `name:value` if named, or just `value` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name().is_empty() {
            write!(f, "{}:{}", self.name(), self.value())
        } else {
            write!(f, "{}", self.value())
        }
    }
}

/// Writes the `name{ base:<b> [i]:<v> }` debug form shared by all counters.
///
/// Words equal to the identity are skipped.
pub(crate) fn debug_words<T>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    striped: &crate::striped::Striped64,
    is_identity: impl Fn(T) -> bool,
) -> fmt::Result
where
    T: crate::striped::Word + Display,
{
    write!(f, "{}{{", name)?;
    let base: T = striped.base();
    if !is_identity(base) {
        write!(f, " base:{base}")?;
    }
    let mut result = Ok(());
    striped.for_each_slot(|i, word| {
        let val = T::from_word(word);
        if result.is_ok() && !is_identity(val) {
            result = write!(f, " [{i}]:{val}");
        }
    });
    result?;
    write!(f, " }}")
}
