//! Prometheus observer for exporting counters using the official `prometheus` crate.
//!
//! [`PrometheusObserver`] builds a fresh [`Registry`] on every render, registers
//! one metric per [`Observable`] and encodes the lot with
//! [`TextEncoder`](prometheus::TextEncoder).
//!
//! # Feature Flag
//!
//! This module requires the `prometheus` feature:
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["prometheus"] }
//! ```
//!
//! # Metric Types
//!
//! The type of each metric is resolved in this order:
//!
//! 1. the per-metric type set with [`with_type`](PrometheusObserver::with_type)
//! 2. the observer-wide type set with [`with_default_type`](PrometheusObserver::with_default_type)
//! 3. the counter's own [`metric_kind`](Observable::metric_kind)
//!
//! Adders report as counters and accumulators as gauges. Integer values use
//! `IntCounter`/`IntGauge`, floating-point values use `Counter`/`Gauge`.
//! Prometheus counters cannot be negative, so negative sums exported as a
//! counter are clamped to zero.
//!
//! # Examples
//!
//! ```rust,ignore
//! use sommatori::counters::long_adder::LongAdder;
//! use sommatori::counters::{MetricKind, Observable};
//! use sommatori::observers::prometheus::PrometheusObserver;
//!
//! let requests = LongAdder::new().with_name("http_requests_total");
//! requests.add(100);
//!
//! let observer = PrometheusObserver::new()
//!     .with_namespace("myapp")
//!     .with_const_label("instance", "localhost:8080")
//!     .with_help("http_requests_total", "Total HTTP requests");
//!
//! let counters: Vec<&dyn Observable> = vec![&requests];
//! let output = observer.render(counters.into_iter())?;
//! ```

use super::{PrometheusError, Result};
use crate::counters::{CounterValue, MetricKind, Observable};
use prometheus::{Counter, Encoder, Gauge, IntCounter, IntGauge, Opts, Registry, TextEncoder};
use std::collections::HashMap;

/// Configuration for a specific metric.
#[derive(Debug, Clone, Default)]
pub struct MetricConfig {
    /// The type of metric; `None` defers to the observer and the counter.
    pub metric_type: Option<MetricKind>,
    /// Help text describing the metric.
    pub help: Option<String>,
    /// Additional labels specific to this metric.
    pub labels: HashMap<String, String>,
}

/// Observer that exports counters to Prometheus format using the official crate.
///
/// # Example
///
/// ```rust,ignore
/// use sommatori::counters::long_adder::LongAdder;
/// use sommatori::counters::Observable;
/// use sommatori::observers::prometheus::PrometheusObserver;
///
/// let counter = LongAdder::new().with_name("my_counter");
/// counter.add(42);
///
/// let counters: Vec<&dyn Observable> = vec![&counter];
/// let output = PrometheusObserver::new().render(counters.into_iter())?;
///
/// assert!(output.contains("my_counter 42"));
/// ```
#[derive(Debug, Default)]
pub struct PrometheusObserver {
    /// Namespace (prefix) for all metrics.
    namespace: Option<String>,
    /// Subsystem for all metrics.
    subsystem: Option<String>,
    /// Constant labels applied to all metrics.
    const_labels: HashMap<String, String>,
    /// Per-metric configuration.
    metric_configs: HashMap<String, MetricConfig>,
    /// Observer-wide type override.
    default_type: Option<MetricKind>,
}

impl PrometheusObserver {
    /// Creates a new `PrometheusObserver`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace (prefix) for all metrics.
    ///
    /// For example, namespace "myapp" + metric "requests" = "myapp_requests".
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Sets the subsystem for all metrics.
    ///
    /// The subsystem appears between namespace and metric name.
    pub fn with_subsystem(mut self, subsystem: &str) -> Self {
        self.subsystem = Some(subsystem.to_string());
        self
    }

    /// Adds a constant label to all metrics.
    pub fn with_const_label(mut self, name: &str, value: &str) -> Self {
        self.const_labels
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Overrides the metric type of every counter without a per-metric type.
    pub fn with_default_type(mut self, metric_type: MetricKind) -> Self {
        self.default_type = Some(metric_type);
        self
    }

    /// Configures a specific metric.
    pub fn with_metric_config(mut self, name: &str, config: MetricConfig) -> Self {
        self.metric_configs.insert(name.to_string(), config);
        self
    }

    /// Sets the metric type for a specific metric.
    pub fn with_type(mut self, name: &str, metric_type: MetricKind) -> Self {
        self.metric_configs
            .entry(name.to_string())
            .or_default()
            .metric_type = Some(metric_type);
        self
    }

    /// Sets the help text for a specific metric.
    pub fn with_help(mut self, name: &str, help: &str) -> Self {
        self.metric_configs
            .entry(name.to_string())
            .or_default()
            .help = Some(help.to_string());
        self
    }

    /// Sanitizes a metric name to be Prometheus-compatible.
    ///
    /// Prometheus metric names must match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
    fn sanitize_name(name: &str) -> String {
        let mut result = String::with_capacity(name.len());
        for c in name.chars() {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                result.push(c);
            } else if c == '-' || c == '.' || c == ' ' {
                result.push('_');
            }
        }
        if result.is_empty() {
            result.push_str("unnamed");
        }
        if result.starts_with(|c: char| c.is_ascii_digit()) {
            result.insert(0, '_');
        }
        result
    }

    /// Builds the full metric name with namespace and subsystem.
    fn build_full_name(&self, name: &str) -> String {
        let sanitized = Self::sanitize_name(name);
        match (&self.namespace, &self.subsystem) {
            (Some(ns), Some(ss)) => format!("{}_{}_{}", ns, ss, sanitized),
            (Some(ns), None) => format!("{}_{}", ns, sanitized),
            (None, Some(ss)) => format!("{}_{}", ss, sanitized),
            (None, None) => sanitized,
        }
    }

    /// Renders counters to Prometheus exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if metric creation, registration, or encoding fails.
    /// Two counters mapping to the same metric name fail registration.
    pub fn render<'a>(&self, counters: impl Iterator<Item = &'a dyn Observable>) -> Result<String> {
        self.render_with(counters, |counter| counter.value())
    }

    /// Renders counters and resets each one as it is read.
    ///
    /// # Errors
    ///
    /// Returns an error if metric creation, registration, or encoding fails.
    pub fn render_and_reset<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Result<String> {
        self.render_with(counters, |counter| counter.value_and_reset())
    }

    /// Renders counters to bytes (useful for HTTP responses).
    pub fn render_bytes<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
    ) -> Result<Vec<u8>> {
        Ok(self.render(counters)?.into_bytes())
    }

    fn render_with<'a>(
        &self,
        counters: impl Iterator<Item = &'a dyn Observable>,
        read: impl Fn(&dyn Observable) -> CounterValue,
    ) -> Result<String> {
        let registry = Registry::new();

        for counter in counters {
            let raw_name = match counter.name() {
                "" => "unnamed",
                name => name,
            };

            let config = self.metric_configs.get(raw_name);
            let kind = config
                .and_then(|c| c.metric_type)
                .or(self.default_type)
                .unwrap_or_else(|| counter.metric_kind());
            let help = config
                .and_then(|c| c.help.clone())
                .unwrap_or_else(|| format!("{} metric", raw_name));

            let mut labels = self.const_labels.clone();
            if let Some(cfg) = config {
                labels.extend(cfg.labels.clone());
            }

            let opts = Opts::new(self.build_full_name(raw_name), help).const_labels(labels);
            Self::register(&registry, opts, kind, read(counter))?;
        }

        Self::encode_registry(&registry)
    }

    fn register(
        registry: &Registry,
        opts: Opts,
        kind: MetricKind,
        value: CounterValue,
    ) -> Result<()> {
        match (kind, value) {
            (MetricKind::Counter, CounterValue::Float(v)) => {
                let counter = Counter::with_opts(opts)?;
                // NaN also collapses to zero here.
                counter.inc_by(v.max(0.0));
                registry.register(Box::new(counter))?;
            }
            (MetricKind::Counter, value) => {
                let counter = IntCounter::with_opts(opts)?;
                counter.inc_by(match value {
                    CounterValue::Signed(v) => v.max(0) as u64,
                    other => other.as_u64(),
                });
                registry.register(Box::new(counter))?;
            }
            (MetricKind::Gauge, CounterValue::Float(v)) => {
                let gauge = Gauge::with_opts(opts)?;
                gauge.set(v);
                registry.register(Box::new(gauge))?;
            }
            (MetricKind::Gauge, value) => {
                let gauge = IntGauge::with_opts(opts)?;
                gauge.set(value.as_i64());
                registry.register(Box::new(gauge))?;
            }
        }
        Ok(())
    }

    fn encode_registry(registry: &Registry) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&registry.gather(), &mut buffer)
            .map_err(|e| PrometheusError::EncodeError(e.to_string()))?;
        Ok(String::from_utf8(buffer)?)
    }
}
