//! Errors raised by the background refresh lifecycle.

use thiserror::Error;

/// Failure to start the cache refresh worker.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The operating system refused to spawn the worker thread.
    #[error("failed to spawn the cache refresh worker")]
    Spawn {
        /// Source error from `std::thread::Builder::spawn`.
        #[source]
        source: std::io::Error,
    },
}
