//! # Sommatori - Contention-Adaptive Striped Adders
//!
//! A Rust library of thread-safe running sums and accumulators that stay fast
//! under heavy write contention. Every counter starts as a single atomic word
//! and only spreads its updates over extra cache-padded slots once threads
//! actually collide on it.
//!
//! ## The Problem
//!
//! A single atomic shared by many threads is correct, but every update moves
//! the cache line holding it between cores. With enough writers the counter
//! becomes the bottleneck of the whole program.
//!
//! A statically sharded counter fixes the contention but pays its full memory
//! cost up front, even for the many counters in a program that are rarely
//! touched.
//!
//! ## The Solution: Adaptive Striping
//!
//! Each counter is built on [`Striped64`](striped::Striped64):
//!
//! 1. **Base word first**: uncontended updates are a single CAS on the base
//!    word, exactly like a plain atomic.
//!
//! 2. **Slots on demand**: the first failed CAS creates a table of two
//!    cache-padded slots. The table doubles when two consecutive collisions
//!    hit the same slot, up to the next power of two of the CPU count.
//!
//! 3. **Per-thread probes**: each thread carries a pseudo-random probe that
//!    selects its slot. A thread that collides rehashes its probe, so threads
//!    spread out over the table without coordination.
//!
//! 4. **Aggregation on read**: `sum()` folds the base word and every slot.
//!    Reads cost more than writes, which is the right trade-off for metrics.
//!
//! ## Available Counter Types
//!
//! | Type | Description | Use Case |
//! |------|-------------|----------|
//! | [`LongAdder`](counters::long_adder::LongAdder) | `i64` running sum | Event counts, request totals |
//! | [`DoubleAdder`](counters::double_adder::DoubleAdder) | `f64` running sum | Accumulated durations |
//! | [`LongAccumulator`](counters::long_accumulator::LongAccumulator) | `i64` fold with a custom operator | Latency maximums |
//! | [`DoubleAccumulator`](counters::double_accumulator::DoubleAccumulator) | `f64` fold with a custom operator | Peak values |
//!
//! ## Quick Start
//!
//! ```rust
//! use sommatori::counters::long_adder::LongAdder;
//! use sommatori::counters::Observable;
//!
//! // Create a counter (can be shared across threads via Arc or a static)
//! let counter = LongAdder::new().with_name("requests");
//!
//! counter.increment();
//! counter.add(5);
//!
//! // Read the total value (folds the base word and all slots)
//! assert_eq!(counter.sum(), 6);
//!
//! // Read and reset in one traversal
//! let total = counter.value_and_reset();
//! assert_eq!(total.as_i64(), 6);
//! ```
//!
//! ## Thread Safety
//!
//! All counter types are `Send + Sync`. The constructors of the integer types
//! are `const`, so they can be declared as `static` items.
//!
//! ## Consistency
//!
//! Reads are not snapshots. A `sum()` that races with updates returns a value
//! that reflects every update completed before it started and possibly some of
//! the concurrent ones. When no thread is updating, the result is exact.
//!
//! ## Memory Usage
//!
//! An untouched counter holds a single cache-padded word. Under contention it
//! grows to at most one cache line per CPU (rounded up to a power of two).
//!
//! ## Observers
//!
//! The library provides optional observer modules for exporting counter values.
//! Each observer is gated behind a feature flag:
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | `json` | [`observers::json`] | Serialize counters to JSON |
//! | `prometheus` | [`observers::prometheus`] | Export in Prometheus exposition format |
//! | `full` | All observers | Enables all observer modules |
//!
//! ### Example: Prometheus Output
//!
//! ```toml
//! [dependencies]
//! sommatori = { version = "0.1", features = ["prometheus"] }
//! ```
//!
//! ```rust,ignore
//! use sommatori::observers::prometheus::PrometheusObserver;
//!
//! let output = PrometheusObserver::new()
//!     .with_namespace("myapp")
//!     .with_const_label("instance", "server-1")
//!     .render(counters.into_iter())?;
//! ```

pub mod adapters;
pub mod counters;
pub(crate) mod error;
pub mod observers;
pub mod striped;

#[cfg(feature = "serde")]
pub mod snapshot;
