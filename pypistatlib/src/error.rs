//! Error types for pypistatlib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while composing queries or transforming results
#[derive(Error, Debug)]
pub enum PypistatError {
    /// Date token is neither a negative day offset nor a valid YYYY-MM-DD date
    #[error("invalid date '{token}': expected a negative day offset or a YYYY-MM-DD date")]
    InvalidDate { token: String },

    /// Result payload does not match the query service's response shape
    #[error("malformed query result: {0}")]
    MalformedResult(String),

    /// A count cell holds something other than a decimal integer
    #[error("count column holds a non-numeric value: '{0}'")]
    BadCount(String),

    /// Percentages were requested over a table with zero downloads
    #[error("cannot compute percentage shares: total download count is zero")]
    EmptyTotal,

    /// Failed to read a result file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
}
