//! Error types for the extraction dispatcher.

use thiserror::Error;

/// Result type alias for dispatcher operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors reported synchronously to callers of the dispatcher.
///
/// Extraction failures never show up here: they happen on the worker long
/// after `submit` returned and are reported through
/// [`ExtractListener::extract_failed`](crate::ExtractListener::extract_failed).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A directory submission contained no eligible archive.
    #[error("Directory does not contain any archives: {0}")]
    NoArchivesFound(String),

    /// A single-file submission has no known local size yet.
    #[error("File does not exist locally: {0}")]
    NotLocallyAvailable(String),

    /// A single-file submission is not a recognised archive.
    #[error("File is not an archive: {0}")]
    NotAnArchive(String),

    /// `start` was called while the worker is already running.
    #[error("Extraction worker is already running")]
    AlreadyRunning,

    /// A configured split-volume pattern failed to compile.
    #[error("Invalid split-volume pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration is structurally invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (config files, spawning the worker thread)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
