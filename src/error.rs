//! Error types for the fwdlens library.

use thiserror::Error;

/// Top-level error type for forward-index builds.
#[derive(Error, Debug)]
pub enum Error {
    /// Building a forward index needs one reader thread plus at least one
    /// batch worker.
    #[error("at least 2 threads are required, got {0}")]
    NotEnoughThreads(usize),

    /// Batch size must be at least one record.
    #[error("batch size must be positive")]
    ZeroBatchSize,

    /// I/O errors during batch write, merge, remap, or concatenation.
    /// Fatal; no partial output is cleaned up.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fwdlens operations.
pub type Result<T> = std::result::Result<T, Error>;
