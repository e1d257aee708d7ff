//! Read-only view of the file tree being submitted.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A node of the file tree: a file or a directory with children.
///
/// `full_path` is relative to the configured local directory. A file whose
/// `local_size` is `None` is known to exist but has not been materialized
/// locally yet.
pub trait FileTree {
    fn name(&self) -> &str;

    fn is_dir(&self) -> bool;

    fn full_path(&self) -> &Path;

    fn local_size(&self) -> Option<u64>;

    fn children(&self) -> &[Self]
    where
        Self: Sized;
}

/// In-memory file tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    name: String,
    full_path: PathBuf,
    is_dir: bool,
    local_size: Option<u64>,
    children: Vec<FileEntry>,
}

impl FileEntry {
    /// A file at `full_path` (relative to the local root).
    pub fn file(full_path: impl Into<PathBuf>, local_size: Option<u64>) -> Self {
        let full_path = full_path.into();
        Self {
            name: file_name(&full_path),
            full_path,
            is_dir: false,
            local_size,
            children: Vec::new(),
        }
    }

    /// A directory at `full_path` with the given children.
    pub fn dir(full_path: impl Into<PathBuf>, children: Vec<FileEntry>) -> Self {
        let full_path = full_path.into();
        Self {
            name: file_name(&full_path),
            full_path,
            is_dir: true,
            local_size: None,
            children,
        }
    }

    /// Build the tree for `relative` by reading `local_root/relative` from disk.
    ///
    /// Children are sorted by name so traversal order is stable.
    pub fn scan(local_root: &Path, relative: &Path) -> io::Result<Self> {
        let absolute = local_root.join(relative);
        let metadata = fs::metadata(&absolute)?;

        if !metadata.is_dir() {
            return Ok(Self::file(relative, Some(metadata.len())));
        }

        let mut names = fs::read_dir(&absolute)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<io::Result<Vec<_>>>()?;
        names.sort();

        let children = names
            .into_iter()
            .map(|name| Self::scan(local_root, &relative.join(name)))
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self::dir(relative, children))
    }
}

impl FileTree for FileEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn full_path(&self) -> &Path {
        &self.full_path
    }

    fn local_size(&self) -> Option<u64> {
        self.local_size
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
