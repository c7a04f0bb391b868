//! Recoverable errors for the graph executor.
//!
//! Contract violations (bad slot index, zero thread count, ring buffer
//! underflow) are caller bugs and panic instead of returning one of these.

use thiserror::Error;

/// Errors that can occur while configuring the executor.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread {index}: {source}")]
    SpawnWorker {
        /// Zero-based index of the worker that failed to start.
        index: usize,
        /// Underlying I/O error from `std::thread::Builder::spawn`.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for executor operations.
pub type Result<T> = std::result::Result<T, Error>;
