//! Archive detection from file names, without reading archive contents.

use crate::error::ExtractError;
use crate::types::{ArchiveFormat, ArchiveInfo};
use std::path::Path;

/// Detect the archive format of a file from its name.
///
/// Detection is case-insensitive and recognises split-volume naming:
/// `name.rar`, `name.r00`, `name.part01.rar`, `name.7z`, `name.7z.001`.
/// Returns `None` for anything that is not a supported archive.
pub fn detect_format(path: &Path) -> Option<ArchiveFormat> {
    let name = path.file_name()?.to_str()?.to_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        return Some(ArchiveFormat::TarGz);
    }
    if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz") {
        return Some(ArchiveFormat::TarBz2);
    }

    let (stem, extension) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }

    match extension {
        "zip" => Some(ArchiveFormat::Zip),
        "tar" => Some(ArchiveFormat::Tar),
        "7z" => Some(ArchiveFormat::SevenZip),
        "rar" => Some(ArchiveFormat::Rar),
        ext if rar_volume_number(ext).is_some() => Some(ArchiveFormat::Rar),
        ext if is_digits(ext) && stem.ends_with(".7z") => Some(ArchiveFormat::SevenZip),
        _ => None,
    }
}

/// Whether the file is a numbered continuation of a split archive, i.e.
/// a volume that extracting the first volume already covers.
pub fn is_continuation_volume(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_lowercase();
    let Some((stem, extension)) = name.rsplit_once('.') else {
        return false;
    };

    if rar_volume_number(extension).is_some() {
        return true;
    }
    if extension == "rar" {
        if let Some((_, part)) = stem.rsplit_once(".part") {
            return is_digits(part) && part.parse::<u32>().map_or(false, |n| n > 1);
        }
        return false;
    }
    if is_digits(extension) && stem.ends_with(".7z") {
        return extension.parse::<u32>().map_or(false, |n| n > 1);
    }
    false
}

/// Probe an archive on disk.
///
/// # Errors
///
/// Returns [`ExtractError::NotFound`] if the file doesn't exist and
/// [`ExtractError::UnsupportedFormat`] if the name is not a known archive.
pub fn probe_archive(path: &Path) -> Result<ArchiveInfo, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }

    let format = detect_format(path).ok_or_else(|| {
        ExtractError::UnsupportedFormat(format!("not an archive: {}", path.display()))
    })?;
    let size_bytes = std::fs::metadata(path)?.len();

    Ok(ArchiveInfo {
        path: path.to_path_buf(),
        format,
        size_bytes,
        continuation_volume: is_continuation_volume(path),
    })
}

/// `r00`, `r01`, ... `r123`: old-style RAR continuation volumes.
fn rar_volume_number(extension: &str) -> Option<u32> {
    let digits = extension.strip_prefix('r')?;
    if digits.len() >= 2 && is_digits(digits) {
        digits.parse().ok()
    } else {
        None
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
