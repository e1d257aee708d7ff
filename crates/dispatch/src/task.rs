//! The unit of extraction work.

use std::path::PathBuf;

/// One archive to extract and where to put its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    pub archive_path: PathBuf,
    pub output_dir: PathBuf,
}

/// A root submission (a file or a directory) and the archives derived from it.
///
/// The archive list is only mutable while the task is being built; once
/// queued the task is shared immutably with the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionTask {
    root_name: String,
    root_is_dir: bool,
    archives: Vec<ArchiveJob>,
}

impl ExtractionTask {
    pub fn new(root_name: impl Into<String>, root_is_dir: bool) -> Self {
        Self {
            root_name: root_name.into(),
            root_is_dir,
            archives: Vec::new(),
        }
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn root_is_dir(&self) -> bool {
        self.root_is_dir
    }

    /// Archives in extraction order.
    pub fn archives(&self) -> &[ArchiveJob] {
        &self.archives
    }

    pub fn add_archive(&mut self, archive_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) {
        self.archives.push(ArchiveJob {
            archive_path: archive_path.into(),
            output_dir: output_dir.into(),
        });
    }

    /// Keep only the archives matching `keep`, preserving order.
    pub(crate) fn retain_archives(&mut self, keep: impl FnMut(&ArchiveJob) -> bool) {
        self.archives.retain(keep);
    }
}
