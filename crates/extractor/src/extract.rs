//! Archive extraction implementation with security features.

use crate::error::ExtractError;
use crate::probe::{detect_format, is_continuation_volume};
use crate::safety::{
    check_link_target, check_size_limit, is_permitted, resolve_target, sanitize_entry_path,
    EntryKind,
};
use crate::types::{ArchiveFormat, ExtractOptions, ExtractStats};
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

const UNIX_FILE_TYPE_MASK: u32 = 0o170000;
const UNIX_SYMLINK: u32 = 0o120000;

/// Extract an archive to the specified output directory.
///
/// This function performs secure extraction with the following features:
/// - Path validation to prevent zip-slip attacks
/// - Size limit enforcement
/// - Configurable overwrite modes
///
/// RAR archives are opened from their first volume, so passing any volume
/// of a split set (`.rar`, `.r00`, `.part02.rar`) extracts the whole set.
///
/// # Errors
///
/// Returns an error if the archive doesn't exist, is not a supported
/// format, is corrupted, violates a security policy, or an I/O error occurs.
pub fn extract_archive(
    archive_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
) -> Result<ExtractStats, ExtractError> {
    let start_time = Instant::now();

    if !archive_path.exists() {
        return Err(ExtractError::NotFound(archive_path.to_path_buf()));
    }

    let format = detect_format(archive_path).ok_or_else(|| {
        ExtractError::UnsupportedFormat(format!("not an archive: {}", archive_path.display()))
    })?;

    if format == ArchiveFormat::SevenZip && is_split_7z(archive_path) {
        return Err(ExtractError::UnsupportedFormat(
            "Multi-part 7-Zip archives are not supported; combine the parts first".to_string(),
        ));
    }

    fs::create_dir_all(output_dir)?;

    debug!(
        archive = %archive_path.display(),
        output = %output_dir.display(),
        %format,
        "extracting archive"
    );

    let mut stats = ExtractStats::default();
    match format {
        ArchiveFormat::Zip => extract_zip(archive_path, output_dir, options, &mut stats)?,
        ArchiveFormat::Tar => {
            let reader = BufReader::new(File::open(archive_path)?);
            extract_tar(reader, output_dir, options, &mut stats)?
        }
        ArchiveFormat::TarGz => {
            let reader = flate2::read::GzDecoder::new(BufReader::new(File::open(archive_path)?));
            extract_tar(reader, output_dir, options, &mut stats)?
        }
        ArchiveFormat::TarBz2 => {
            let reader = bzip2::read::BzDecoder::new(BufReader::new(File::open(archive_path)?));
            extract_tar(reader, output_dir, options, &mut stats)?
        }
        ArchiveFormat::SevenZip => extract_7z(archive_path, output_dir, options, &mut stats)?,
        ArchiveFormat::Rar => extract_rar(archive_path, output_dir, options, &mut stats)?,
    }

    stats.duration = start_time.elapsed();
    debug!(
        archive = %archive_path.display(),
        files = stats.files_extracted,
        bytes = stats.bytes_written,
        skipped = stats.entries_skipped,
        "archive extracted"
    );
    Ok(stats)
}

/// Validate an entry name and work out where it lands.
///
/// Returns `Ok(None)` for entries that are skipped: unsafe names are logged
/// and skipped rather than aborting the whole archive.
fn entry_target(output_dir: &Path, entry_name: &Path) -> Option<PathBuf> {
    match sanitize_entry_path(entry_name) {
        Ok(relative) => Some(output_dir.join(relative)),
        Err(e) => {
            warn!(entry = %entry_name.display(), error = %e, "skipping unsafe entry");
            None
        }
    }
}

/// Size-check, resolve the overwrite target and create parent directories
/// for a file entry. `None` means skip it.
fn prepare_file(
    target: &Path,
    size: u64,
    options: &ExtractOptions,
    stats: &mut ExtractStats,
) -> Result<Option<PathBuf>, ExtractError> {
    check_size_limit(stats.bytes_written.saturating_add(size), options.size_limit_bytes)?;

    let Some(path) = resolve_target(target, options.overwrite)? else {
        stats.entries_skipped += 1;
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(Some(path))
}

fn extract_zip(
    archive_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
    stats: &mut ExtractStats,
) -> Result<(), ExtractError> {
    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(archive_path)?))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(target) = entry_target(output_dir, Path::new(entry.name())) else {
            stats.entries_skipped += 1;
            continue;
        };

        let kind = if entry.is_dir() {
            EntryKind::Directory
        } else if entry
            .unix_mode()
            .map_or(false, |mode| mode & UNIX_FILE_TYPE_MASK == UNIX_SYMLINK)
        {
            EntryKind::Symlink
        } else {
            EntryKind::File
        };

        match kind {
            EntryKind::Directory => fs::create_dir_all(&target)?,
            EntryKind::File => {
                let Some(path) = prepare_file(&target, entry.size(), options, stats)? else {
                    continue;
                };
                let mut out = File::create(&path)?;
                stats.bytes_written += io::copy(&mut entry, &mut out)?;
                stats.files_extracted += 1;
            }
            // Symlinks inside ZIP files are stored as plain text; writing
            // them out as links is not supported, so they are always skipped.
            EntryKind::Symlink | EntryKind::Other => {
                debug!(entry = entry.name(), "skipping link entry");
                stats.entries_skipped += 1;
            }
        }
    }

    Ok(())
}

fn extract_tar<R: Read>(
    reader: R,
    output_dir: &Path,
    options: &ExtractOptions,
    stats: &mut ExtractStats,
) -> Result<(), ExtractError> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries().map_err(corrupted)? {
        let mut entry = entry.map_err(corrupted)?;
        let entry_name = entry.path()?.into_owned();
        let Some(target) = entry_target(output_dir, &entry_name) else {
            stats.entries_skipped += 1;
            continue;
        };

        let entry_type = entry.header().entry_type();
        let kind = if entry_type.is_dir() {
            EntryKind::Directory
        } else if entry_type.is_file() {
            EntryKind::File
        } else if entry_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Other
        };

        if !is_permitted(kind, options) {
            debug!(entry = %entry_name.display(), ?kind, "entry type not permitted");
            stats.entries_skipped += 1;
            continue;
        }

        if kind == EntryKind::Symlink {
            let link_target = entry
                .link_name()?
                .map(|target| target.into_owned())
                .unwrap_or_default();
            if let Err(e) = check_link_target(&link_target) {
                warn!(
                    entry = %entry_name.display(),
                    target = %link_target.display(),
                    error = %e,
                    "skipping symlink pointing outside the output directory"
                );
                stats.entries_skipped += 1;
                continue;
            }
        }

        match kind {
            EntryKind::Directory => fs::create_dir_all(&target)?,
            _ => {
                let size = entry.header().size().map_err(corrupted)?;
                let Some(path) = prepare_file(&target, size, options, stats)? else {
                    continue;
                };
                entry.unpack(&path)?;
                stats.bytes_written += size;
                stats.files_extracted += 1;
            }
        }
    }

    Ok(())
}

fn extract_7z(
    archive_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
    stats: &mut ExtractStats,
) -> Result<(), ExtractError> {
    // The callback can only return the library's error type, so our own
    // error is parked here and iteration is stopped with `Ok(false)`.
    let mut failure = None;
    let decoded = sevenz_rust2::decompress_file_with_extract_fn(
        archive_path,
        output_dir,
        |entry, reader, _| match extract_7z_entry(entry, reader, output_dir, options, stats) {
            Ok(()) => Ok(true),
            Err(e) => {
                failure = Some(e);
                Ok(false)
            }
        },
    );

    if let Some(e) = failure {
        return Err(e);
    }
    decoded.map_err(corrupted)
}

fn extract_7z_entry(
    entry: &sevenz_rust2::SevenZArchiveEntry,
    reader: &mut dyn Read,
    output_dir: &Path,
    options: &ExtractOptions,
    stats: &mut ExtractStats,
) -> Result<(), ExtractError> {
    let Some(target) = entry_target(output_dir, Path::new(entry.name())) else {
        stats.entries_skipped += 1;
        return skip_stream(reader);
    };

    if entry.is_directory() {
        fs::create_dir_all(&target)?;
        return Ok(());
    }
    if entry.is_anti_item() {
        stats.entries_skipped += 1;
        return skip_stream(reader);
    }

    let Some(path) = prepare_file(&target, entry.size(), options, stats)? else {
        return skip_stream(reader);
    };
    let mut out = File::create(&path)?;
    stats.bytes_written += io::copy(reader, &mut out)?;
    stats.files_extracted += 1;
    Ok(())
}

/// Entries of a solid block share one stream; a skipped entry must still
/// be read through so the next one starts at the right offset.
fn skip_stream(reader: &mut dyn Read) -> Result<(), ExtractError> {
    io::copy(reader, &mut io::sink())?;
    Ok(())
}

fn extract_rar(
    archive_path: &Path,
    output_dir: &Path,
    options: &ExtractOptions,
    stats: &mut ExtractStats,
) -> Result<(), ExtractError> {
    // Always start from the first volume; unrar walks the rest itself.
    let archive = unrar::Archive::new(archive_path).as_first_part();
    let mut cursor = archive.open_for_processing().map_err(corrupted)?;

    while let Some(header) = cursor.read_header().map_err(corrupted)? {
        let entry = header.entry();
        let entry_name = entry.filename.clone();
        let size = entry.unpacked_size;
        let is_directory = entry.is_directory();

        let target = match entry_target(output_dir, &entry_name) {
            Some(target) if is_directory => {
                fs::create_dir_all(&target)?;
                None
            }
            Some(target) => prepare_file(&target, size, options, stats)?,
            None => {
                stats.entries_skipped += 1;
                None
            }
        };

        cursor = match target {
            Some(path) => {
                let next = header.extract_to(&path).map_err(corrupted)?;
                stats.bytes_written += size;
                stats.files_extracted += 1;
                next
            }
            None => header.skip().map_err(corrupted)?,
        };
    }

    Ok(())
}

fn is_split_7z(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| ext.bytes().all(|b| b.is_ascii_digit()))
        || is_continuation_volume(path)
}

fn corrupted<E: std::fmt::Display>(err: E) -> ExtractError {
    ExtractError::Corrupted(err.to_string())
}
