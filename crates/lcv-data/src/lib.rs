//! Data retrieval and tabular handling for the light-curve pipeline
//!
//! Owns the column-oriented observation table, the remote fetch loop with
//! its memoization cache, upload-file star extraction, and the preference
//! set shared with the shell.

pub mod cache;
pub mod fetch;
pub mod frame;
pub mod prefs;
pub mod upload;

use thiserror::Error;

// Re-exports
pub use cache::{FetchCache, FetchKey};
pub use fetch::{HttpTransport, ObservationFetcher, ObservationTransport};
pub use frame::{Column, ColumnTable};
pub use prefs::Preferences;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    /// Host unreachable, DNS failure, timeout. Fatal for the request.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A response that cannot be parsed or fails structural validation.
    /// Per-delimiter; the fetch loop degrades to an empty result.
    #[error("malformed response: {0}")]
    Structural(String),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Programming-contract violation on the observation table.
    #[error("length {actual} does not match row count {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("upload file rejected: {0}")]
    UploadRejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
