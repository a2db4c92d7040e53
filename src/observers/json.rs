//! JSON observer for serializing counters.
//!
//! [`JsonObserver`] turns a collection of [`Observable`] counters into the
//! [`snapshot`](crate::snapshot) types and serializes them with `serde_json`.
//!
//! # Feature Flag
//!
//! This module requires the `json` feature:
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use sommatori::counters::long_adder::LongAdder;
//! use sommatori::counters::Observable;
//! use sommatori::observers::json::JsonObserver;
//!
//! let requests = LongAdder::new().with_name("http_requests");
//! let errors = LongAdder::new().with_name("http_errors");
//!
//! requests.add(1000);
//! errors.add(5);
//!
//! let counters: Vec<&dyn Observable> = vec![&requests, &errors];
//! let json = JsonObserver::new().to_json(counters.into_iter())?;
//! // [{"name":"http_requests","value":1000},{"name":"http_errors","value":5}]
//! ```

use super::Result;
use crate::counters::Observable;
use crate::snapshot::{CounterSnapshot, MetricsSnapshot};
use serde::Serialize;

/// Configuration for the JSON observer.
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Whether to pretty-print the JSON output.
    pub pretty: bool,
    /// Whether to include a timestamp in the output.
    pub include_timestamp: bool,
    /// Whether to wrap counters in a [`MetricsSnapshot`] object.
    pub wrap_in_snapshot: bool,
}

/// An observer that serializes counters to JSON format.
///
/// By default the output is a bare array of `{"name", "value"}` objects. With
/// [`wrap_in_snapshot`](Self::wrap_in_snapshot) it becomes a
/// [`MetricsSnapshot`] object, optionally carrying a timestamp.
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    config: JsonConfig,
}

impl JsonObserver {
    /// Creates a new JSON observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new JSON observer with the specified configuration.
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Enables or disables pretty-printing.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables timestamp inclusion.
    ///
    /// Only has effect when `wrap_in_snapshot` is also enabled.
    pub fn include_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    /// Enables or disables wrapping the output in a [`MetricsSnapshot`].
    pub fn wrap_in_snapshot(mut self, enabled: bool) -> Self {
        self.config.wrap_in_snapshot = enabled;
        self
    }

    /// Collects counters into a vector of [`CounterSnapshot`].
    pub fn collect<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Vec<CounterSnapshot> {
        counters.map(CounterSnapshot::from_observable).collect()
    }

    /// Collects counters and resets each one as it is read.
    pub fn collect_and_reset<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Vec<CounterSnapshot> {
        counters
            .map(CounterSnapshot::from_observable_and_reset)
            .collect()
    }

    /// Serializes counters to a JSON string.
    pub fn to_json<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Result<String> {
        self.render(self.collect(counters))
    }

    /// Serializes counters to JSON and resets them.
    pub fn to_json_and_reset<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Result<String> {
        self.render(self.collect_and_reset(counters))
    }

    /// Serializes counters to a JSON byte vector.
    pub fn to_json_bytes<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Result<Vec<u8>> {
        Ok(self.to_json(counters)?.into_bytes())
    }

    fn render(&self, snapshots: Vec<CounterSnapshot>) -> Result<String> {
        if self.config.wrap_in_snapshot {
            let snapshot = if self.config.include_timestamp {
                MetricsSnapshot::with_timestamp(snapshots, current_timestamp_ms())
            } else {
                MetricsSnapshot::new(snapshots)
            };
            self.serialize(&snapshot)
        } else {
            self.serialize(&snapshots)
        }
    }

    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let json = if self.config.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

/// Returns the current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::double_accumulator::DoubleAccumulator;
    use crate::counters::double_adder::DoubleAdder;
    use crate::counters::long_accumulator::LongAccumulator;
    use crate::counters::long_adder::LongAdder;
    use crate::counters::CounterValue;

    #[test]
    fn test_to_json_empty() {
        let counters: Vec<&dyn Observable> = vec![];
        let json = JsonObserver::new().to_json(counters.into_iter()).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_to_json_multiple_counters() {
        let requests = LongAdder::new().with_name("requests");
        let errors = LongAdder::new().with_name("errors");
        requests.add(1000);
        errors.add(5);

        let counters: Vec<&dyn Observable> = vec![&requests, &errors];
        let json = JsonObserver::new().to_json(counters.into_iter()).unwrap();

        assert_eq!(
            json,
            r#"[{"name":"requests","value":1000},{"name":"errors","value":5}]"#
        );
    }

    #[test]
    fn test_to_json_all_counter_types() {
        let adder = LongAdder::new().with_name("adder");
        let double = DoubleAdder::new().with_name("double");
        let max = LongAccumulator::max().with_name("max");
        let min = DoubleAccumulator::min().with_name("min");
        adder.decrement();
        double.add(0.25);
        max.accumulate(7);
        min.accumulate(-1.5);

        let counters: Vec<&dyn Observable> = vec![&adder, &double, &max, &min];
        let json = JsonObserver::new().to_json(counters.into_iter()).unwrap();

        assert_eq!(
            json,
            r#"[{"name":"adder","value":-1},{"name":"double","value":0.25},{"name":"max","value":7},{"name":"min","value":-1.5}]"#
        );
    }

    #[test]
    fn test_to_json_pretty() {
        let counter = LongAdder::new().with_name("test");
        counter.increment();

        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = JsonObserver::new()
            .pretty(true)
            .to_json(counters.into_iter())
            .unwrap();

        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_with_snapshot() {
        let counter = LongAdder::new().with_name("metric");
        counter.add(100);

        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = JsonObserver::new()
            .wrap_in_snapshot(true)
            .to_json(counters.into_iter())
            .unwrap();

        assert_eq!(json, r#"{"counters":[{"name":"metric","value":100}]}"#);
    }

    #[test]
    fn test_to_json_with_timestamp() {
        let counter = LongAdder::new().with_name("metric");
        counter.add(50);

        let config = JsonConfig {
            pretty: false,
            include_timestamp: true,
            wrap_in_snapshot: true,
        };
        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = JsonObserver::with_config(config)
            .to_json(counters.into_iter())
            .unwrap();

        let parsed: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        assert!(parsed.timestamp_ms.is_some());
        assert_eq!(parsed.get("metric").unwrap().value, CounterValue::Unsigned(50));
    }

    #[test]
    fn test_to_json_and_reset() {
        let counter = LongAdder::new().with_name("resettable");
        counter.add(75);

        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = JsonObserver::new()
            .to_json_and_reset(counters.into_iter())
            .unwrap();

        assert!(json.contains("75"));
        assert_eq!(counter.value(), CounterValue::Signed(0));
    }

    #[test]
    fn test_unnamed_counter() {
        let counter = LongAdder::new();
        counter.add(99);

        let counters: Vec<&dyn Observable> = vec![&counter];
        let json = JsonObserver::new().to_json(counters.into_iter()).unwrap();

        assert!(json.contains("(unnamed)"));
    }

    #[test]
    fn test_to_json_bytes() {
        let counter = LongAdder::new().with_name("bytes_test");
        counter.add(123);

        let counters: Vec<&dyn Observable> = vec![&counter];
        let bytes = JsonObserver::new()
            .to_json_bytes(counters.into_iter())
            .unwrap();

        assert_eq!(bytes, br#"[{"name":"bytes_test","value":123}]"#.to_vec());
    }
}
