//! Error types for archive extraction operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for extraction operations.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Archive file not found at the specified path.
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    /// The archive format is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A security violation was detected during extraction.
    #[error("Security violation: {0}")]
    Security(#[from] SecurityError),

    /// The extraction size limit was exceeded.
    #[error("Size limit exceeded: {current} bytes > {limit} bytes")]
    SizeLimitExceeded {
        /// Extracted size in bytes including the entry that crossed the limit
        current: u64,
        /// Configured size limit in bytes
        limit: u64,
    },

    /// The archive is corrupted or malformed.
    #[error("Corrupted archive: {0}")]
    Corrupted(String),

    /// An I/O error occurred during extraction.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Security-related errors during extraction.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Path traversal attempt detected (e.g., "../../../etc/passwd").
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),

    /// Absolute path not allowed in archive entries.
    #[error("Absolute path not allowed: {0}")]
    AbsolutePath(String),
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io_err) => ExtractError::Io(io_err),
            zip::result::ZipError::UnsupportedArchive(msg) => {
                ExtractError::UnsupportedFormat(msg.to_string())
            }
            other => ExtractError::Corrupted(other.to_string()),
        }
    }
}
