//! Observer implementations for collecting and exporting counter metrics.
//!
//! - [`json`] - Serialize counters to JSON format
//! - [`prometheus`] - Export counters in Prometheus exposition format
//!
//! All observers take an iterator of `&dyn Observable`, so adders and
//! accumulators of every value type can be exported together, and all of them
//! report failures through the unified [`ObserverError`] type.
//!
//! # Feature Flags
//!
//! - `json` - Enables the [`json`] module
//! - `prometheus` - Enables the [`prometheus`] module
//! - `full` - Enables all observer modules
//!
//! # Example
//!
//! ```rust,ignore
//! use sommatori::counters::long_adder::LongAdder;
//! use sommatori::counters::Observable;
//! use sommatori::observers::Result;
//!
//! static REQUESTS: LongAdder = LongAdder::new().with_name("requests");
//! static ERRORS: LongAdder = LongAdder::new().with_name("errors");
//!
//! fn export_metrics() -> Result<String> {
//!     let counters: &[&'static dyn Observable] = &[&REQUESTS, &ERRORS];
//!
//!     use sommatori::observers::prometheus::PrometheusObserver;
//!     PrometheusObserver::new().render(counters.iter().copied())
//! }
//! ```

mod error;

pub use error::{ObserverError, Result};

#[cfg(feature = "prometheus")]
pub use error::PrometheusError;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "prometheus")]
pub mod prometheus;
