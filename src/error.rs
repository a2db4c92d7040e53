//! Error type of the striped core.
//!
//! The update protocol never surfaces errors to callers: a failed
//! compare-and-swap is an expected event handled by retrying. The only
//! failure the core can observe is running out of memory while reserving a
//! table, which it reports internally with [`Error`] and then degrades
//! gracefully (keep the current table, or fall back to the base word).

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors raised inside the striped core.
#[derive(Debug, Error)]
pub enum Error {
    /// The slot table could not be reserved.
    #[error("cannot allocate a striped table of {len} slots: {source}")]
    TableAllocation {
        /// Requested table length.
        len: usize,
        /// Underlying allocator error.
        #[source]
        source: TryReserveError,
    },
}

/// Result type of the striped core.
pub type Result<T> = std::result::Result<T, Error>;
