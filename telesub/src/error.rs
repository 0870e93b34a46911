//! Extraction error types.

use thiserror::Error;

/// Errors that end an extraction run.
///
/// Stream-level problems (sync loss, continuity gaps, bit errors) are
/// recovered internally and surface only as counters; an `ExtractError`
/// means the run itself cannot proceed.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Configuration rejected up front.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Transport stream layer failure.
    #[error(transparent)]
    Ts(#[from] telesub_ts::TsError),

    /// Reader failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
