//! Resettable wrapper for counters that reset on observation.
//!
//! [`Resettable`] turns every `value()` into a read-and-reset, which is what
//! per-period metrics need (requests per scrape, peak latency since the last
//! report).

use crate::counters::{CounterValue, MetricKind, Observable};
use std::fmt::{self, Debug};
use std::ops::Deref;

/// A wrapper that resets a counter when `value()` is called.
///
/// The reset uses the inner counter's `value_and_reset()`, so for striped
/// counters it is a single traversal that swaps every word with the identity.
///
/// # Example
///
/// ```rust
/// use sommatori::adapters::Resettable;
/// use sommatori::counters::long_accumulator::LongAccumulator;
/// use sommatori::counters::Observable;
///
/// let peak = Resettable::new(LongAccumulator::max().with_name("latency_peak"));
/// peak.accumulate(120);
/// peak.accumulate(80);
///
/// assert_eq!(peak.value().as_i64(), 120);
///
/// peak.accumulate(95);
/// assert_eq!(peak.value().as_i64(), 95);
/// ```
pub struct Resettable<T> {
    inner: T,
}

impl<T> Resettable<T> {
    /// Creates a new resettable wrapper around the given counter.
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Returns a reference to the inner counter.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Consumes the wrapper and returns the inner counter.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Observable> Observable for Resettable<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the current value AND resets the counter.
    fn value(&self) -> CounterValue {
        self.inner.value_and_reset()
    }

    fn value_and_reset(&self) -> CounterValue {
        self.inner.value_and_reset()
    }

    fn metric_kind(&self) -> MetricKind {
        self.inner.metric_kind()
    }
}

impl<T: Debug> Debug for Resettable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resettable")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Allows transparent access to the inner counter's methods.
impl<T> Deref for Resettable<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
