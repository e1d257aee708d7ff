//! # Extractor
//!
//! Archive format detection and safe extraction.
//!
//! This library backs the extraction dispatcher: it answers "is this file an
//! archive?" from its name and unpacks a single archive into an output
//! directory, refusing entries that would escape it.
//!
//! ## Supported Formats
//!
//! - ZIP
//! - TAR (plain, gzip, bzip2)
//! - 7-Zip (single volume)
//! - RAR, including old-style (`.r00`) and new-style (`.partNN.rar`) split sets
//!
//! ## Example
//!
//! ```rust,no_run
//! use extractor::{detect_format, extract, ExtractOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = Path::new("movie.rar");
//! if detect_format(archive).is_some() {
//!     let stats = extract(archive, Path::new("output"), &ExtractOptions::default())?;
//!     println!("Extracted {} files ({} bytes)", stats.files_extracted, stats.bytes_written);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod extract;
pub mod probe;
pub mod safety;
pub mod types;

// Re-export main types
pub use error::{ExtractError, SecurityError};
pub use probe::{detect_format, is_continuation_volume};
pub use safety::EntryKind;
pub use types::{ArchiveFormat, ArchiveInfo, ExtractOptions, ExtractStats, OverwriteMode};

use std::path::Path;

/// Probe an archive on disk: format, size and split-volume role.
///
/// # Errors
///
/// Returns an error if the file doesn't exist or is not a supported archive.
pub fn probe(path: &Path) -> Result<ArchiveInfo, ExtractError> {
    probe::probe_archive(path)
}

/// Extract an archive to the specified output directory.
///
/// The output directory is created if needed. Extraction runs to completion
/// on the calling thread.
///
/// # Errors
///
/// Returns an error if:
/// - The archive file doesn't exist or is corrupted
/// - The format is unsupported
/// - The size limit is exceeded
/// - I/O errors occur
pub fn extract(
    archive_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<ExtractStats, ExtractError> {
    extract::extract_archive(archive_path, output_dir, options)
}
