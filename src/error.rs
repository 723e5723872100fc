//! Error types for bounded-source.

use std::io;
use thiserror::Error;

/// Structured error types for bounded-source
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, such as a zero bundle size hint.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A reader was driven out of protocol order.
    #[error("illegal reader state: {0}")]
    IllegalState(String),

    /// A source under verification violated a splitting or progress invariant.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// UTF-8 decoding error in a line record.
    #[error("invalid UTF-8 at byte {byte}: {message}")]
    Utf8 {
        /// Byte position of the offending line.
        byte: u64,
        /// Error message.
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV serialization failed")]
    Csv(#[from] csv::Error),

    /// Mutex poisoned by a panic in another thread.
    #[error("range tracker lock poisoned")]
    MutexPoisoned,

    /// I/O error with context.
    #[error("{message}: {path}")]
    Io {
        /// File path where error occurred.
        path: String,
        /// Error description.
        message: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Builds an `Error::Assertion` that shows the expected and actual values.
    pub(crate) fn mismatch(
        what: &str,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        Self::Assertion(format!("{what}: expected {expected:?}, got {actual:?}"))
    }
}
