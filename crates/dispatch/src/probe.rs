//! The archive backend the dispatcher calls into.

use extractor::{ExtractError, ExtractOptions};
use std::path::Path;

/// Detects archives and extracts them.
///
/// `extract` runs on the worker thread and is never interrupted; shutdown
/// only takes effect between archives.
pub trait ArchiveProbe: Send + Sync {
    /// Whether the file at `path` is an archive this probe can extract.
    fn is_archive(&self, path: &Path) -> bool;

    /// Extract one archive into `output_dir`.
    fn extract(&self, archive_path: &Path, output_dir: &Path) -> Result<(), ExtractError>;
}

/// [`ArchiveProbe`] backed by the `extractor` crate.
#[derive(Debug, Clone, Default)]
pub struct ExtractorProbe {
    options: ExtractOptions,
}

impl ExtractorProbe {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }
}

impl ArchiveProbe for ExtractorProbe {
    fn is_archive(&self, path: &Path) -> bool {
        extractor::detect_format(path).is_some()
    }

    fn extract(&self, archive_path: &Path, output_dir: &Path) -> Result<(), ExtractError> {
        let stats = extractor::extract(archive_path, output_dir, &self.options)?;
        tracing::info!(
            archive = %archive_path.display(),
            files = stats.files_extracted,
            bytes = stats.bytes_written,
            elapsed_ms = stats.duration.as_millis() as u64,
            "archive extracted"
        );
        Ok(())
    }
}
