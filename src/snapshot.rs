//! Serializable point-in-time captures of counter values.
//!
//! # Feature Flag
//!
//! This module requires the `serde` feature:
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["serde"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use sommatori::counters::long_adder::LongAdder;
//! use sommatori::counters::Observable;
//! use sommatori::snapshot::CounterSnapshot;
//!
//! let counter = LongAdder::new().with_name("requests");
//! counter.add(42);
//!
//! let snapshot = CounterSnapshot::from_observable(&counter);
//! let json = serde_json::to_string(&snapshot)?;
//! assert_eq!(json, r#"{"name":"requests","value":42}"#);
//! ```

use crate::counters::{CounterValue, Observable};
use serde::{Deserialize, Serialize};

const UNNAMED: &str = "(unnamed)";

fn display_name(counter: &dyn Observable) -> String {
    match counter.name() {
        "" => UNNAMED.to_string(),
        name => name.to_string(),
    }
}

/// A snapshot of a single counter's state.
///
/// Values serialize untagged, so integers come out as JSON integers and
/// [`CounterValue::Float`] as a JSON number with a fraction or exponent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CounterSnapshot {
    /// The name of the counter, `"(unnamed)"` for counters without one.
    pub name: String,
    /// The value of the counter.
    pub value: CounterValue,
}

impl CounterSnapshot {
    /// Creates a new counter snapshot.
    pub fn new(name: impl Into<String>, value: CounterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Creates a snapshot from an observable counter.
    pub fn from_observable(counter: &dyn Observable) -> Self {
        Self {
            name: display_name(counter),
            value: counter.value(),
        }
    }

    /// Creates a snapshot from an observable counter and resets it.
    pub fn from_observable_and_reset(counter: &dyn Observable) -> Self {
        Self {
            name: display_name(counter),
            value: counter.value_and_reset(),
        }
    }
}

/// A collection of counter snapshots taken together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    /// Optional timestamp in milliseconds since Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// The counter snapshots.
    pub counters: Vec<CounterSnapshot>,
}

impl MetricsSnapshot {
    /// Creates a new metrics snapshot with the given counters.
    pub fn new(counters: Vec<CounterSnapshot>) -> Self {
        Self {
            timestamp_ms: None,
            counters,
        }
    }

    /// Creates a new metrics snapshot with counters and a timestamp.
    pub fn with_timestamp(counters: Vec<CounterSnapshot>, timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms: Some(timestamp_ms),
            counters,
        }
    }

    /// Finds a counter by name.
    pub fn get(&self, name: &str) -> Option<&CounterSnapshot> {
        self.counters.iter().find(|c| c.name == name)
    }

    /// Collects snapshots from an iterator of observable counters.
    pub fn collect<'a>(counters: impl Iterator<Item = &'a dyn Observable>) -> Self {
        Self::new(counters.map(CounterSnapshot::from_observable).collect())
    }

    /// Collects snapshots and resets every counter.
    pub fn collect_and_reset<'a>(counters: impl Iterator<Item = &'a dyn Observable>) -> Self {
        Self::new(
            counters
                .map(CounterSnapshot::from_observable_and_reset)
                .collect(),
        )
    }

    /// Collects snapshots with a timestamp.
    pub fn collect_with_timestamp<'a>(
        counters: impl Iterator<Item = &'a dyn Observable>,
        timestamp_ms: u64,
    ) -> Self {
        Self::with_timestamp(
            counters.map(CounterSnapshot::from_observable).collect(),
            timestamp_ms,
        )
    }
}
