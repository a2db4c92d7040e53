//! Wrapper types that change how a counter reacts to observation.
//!
//! | Wrapper | Description |
//! |---------|-------------|
//! | [`Resettable`] | `value()` reads and resets - for per-period metrics |
//! | [`NonResettable`] | `value_and_reset()` never resets - for all-time totals |
//!
//! Both wrappers dereference to the inner counter, so its update methods
//! (`add`, `accumulate`, ...) stay available.
//!
//! # Examples
//!
//! ```rust
//! use sommatori::adapters::{NonResettable, Resettable};
//! use sommatori::counters::long_adder::LongAdder;
//! use sommatori::counters::Observable;
//!
//! let period = Resettable::new(LongAdder::new().with_name("period_requests"));
//! let total = NonResettable::new(LongAdder::new().with_name("total_requests"));
//!
//! period.add(10);
//! total.add(10);
//!
//! assert_eq!(period.value().as_i64(), 10);
//! assert_eq!(period.value().as_i64(), 0);
//! assert_eq!(total.value_and_reset().as_i64(), 10);
//! assert_eq!(total.value().as_i64(), 10);
//! ```

mod non_resettable;
mod resettable;

pub use non_resettable::NonResettable;
pub use resettable::Resettable;
