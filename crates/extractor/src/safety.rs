//! Entry path validation and extraction policy checks.
//!
//! Every entry read from an archive goes through [`sanitize_entry_path`]
//! before anything is written, and every symlink target through
//! [`check_link_target`], so a crafted archive cannot escape the output
//! directory (zip-slip).

use crate::error::{ExtractError, SecurityError};
use crate::types::{ExtractOptions, OverwriteMode};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Kind of an archive entry, as far as extraction policy cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Hard links, devices, fifos and anything else
    Other,
}

/// Normalizes an entry path and rejects anything that would resolve
/// outside the output directory.
///
/// ```
/// use std::path::Path;
/// use extractor::safety::sanitize_entry_path;
///
/// assert_eq!(sanitize_entry_path(Path::new("./a/b.txt")).unwrap(), Path::new("a/b.txt"));
/// assert!(sanitize_entry_path(Path::new("../etc/passwd")).is_err());
/// assert!(sanitize_entry_path(Path::new("/etc/passwd")).is_err());
/// ```
pub fn sanitize_entry_path(path: &Path) -> Result<PathBuf, SecurityError> {
    if path.is_absolute() || path.has_root() {
        return Err(SecurityError::AbsolutePath(path.display().to_string()));
    }

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(SecurityError::PathTraversal(path.display().to_string()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SecurityError::AbsolutePath(path.display().to_string()));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(SecurityError::PathTraversal(format!(
            "{} normalizes to an empty path",
            path.display()
        )));
    }

    Ok(normalized)
}

/// Rejects symlink targets that could lead outside the output directory.
///
/// Only relative targets without `..` are accepted, so a link always
/// resolves below the directory holding it and later entries written
/// through it stay inside the output directory.
pub fn check_link_target(target: &Path) -> Result<(), SecurityError> {
    sanitize_entry_path(target).map(|_| ())
}

/// Fails once the running total would cross the configured limit.
pub fn check_size_limit(total_bytes: u64, limit: Option<u64>) -> Result<(), ExtractError> {
    match limit {
        Some(limit) if total_bytes > limit => Err(ExtractError::SizeLimitExceeded {
            current: total_bytes,
            limit,
        }),
        _ => Ok(()),
    }
}

/// Whether entries of this kind may be written with the given options.
pub fn is_permitted(kind: EntryKind, options: &ExtractOptions) -> bool {
    match kind {
        EntryKind::File | EntryKind::Directory => true,
        EntryKind::Symlink => options.allow_symlinks,
        EntryKind::Other => false,
    }
}

/// Resolves where a file entry should be written.
///
/// Returns `None` when the entry must be skipped (the target exists and the
/// mode is [`OverwriteMode::Skip`]).
pub fn resolve_target(path: &Path, mode: OverwriteMode) -> io::Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(Some(path.to_path_buf()));
    }

    match mode {
        OverwriteMode::Replace => Ok(Some(path.to_path_buf())),
        OverwriteMode::Skip => Ok(None),
        OverwriteMode::Rename => {
            let parent = path.parent().unwrap_or_else(|| Path::new(""));
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string());
            let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

            for i in 1..1000 {
                let name = match &extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let candidate = parent.join(name);
                if !candidate.exists() {
                    return Ok(Some(candidate));
                }
            }

            Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("no free name for {}", path.display()),
            ))
        }
    }
}
