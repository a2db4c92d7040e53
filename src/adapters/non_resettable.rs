//! Non-resettable wrapper for monotonic totals.
//!
//! [`NonResettable`] makes `value_and_reset()` behave like `value()`, so a
//! counter keeps accumulating even when an observer collects with reset.
//! Prometheus counters, which must never go down, are the typical use.

use crate::counters::{CounterValue, MetricKind, Observable};
use std::fmt::{self, Debug};
use std::ops::Deref;

/// A wrapper that prevents a counter from being reset.
///
/// # Example
///
/// ```rust
/// use sommatori::adapters::NonResettable;
/// use sommatori::counters::long_adder::LongAdder;
/// use sommatori::counters::Observable;
///
/// let total = NonResettable::new(LongAdder::new().with_name("total_events"));
/// total.add(50);
/// total.add(50);
///
/// assert_eq!(total.value_and_reset().as_i64(), 100);
/// assert_eq!(total.value().as_i64(), 100);
/// ```
pub struct NonResettable<T> {
    inner: T,
}

impl<T> NonResettable<T> {
    /// Creates a new non-resettable wrapper around the given counter.
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

impl<T: Observable> Observable for NonResettable<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn value(&self) -> CounterValue {
        self.inner.value()
    }

    /// Returns the current value WITHOUT resetting the counter.
    fn value_and_reset(&self) -> CounterValue {
        self.inner.value()
    }

    fn metric_kind(&self) -> MetricKind {
        self.inner.metric_kind()
    }
}

impl<T: Debug> Debug for NonResettable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonResettable")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Allows transparent access to the inner counter's methods.
impl<T> Deref for NonResettable<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
