//! Integration tests for archive probing functionality.

use extractor::{probe, ArchiveFormat, ExtractError};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

#[test]
fn test_probe_reports_size_and_format() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bundle.tar.gz", &[0u8; 64]);

    let info = probe(&path).unwrap();

    assert_eq!(info.format, ArchiveFormat::TarGz);
    assert_eq!(info.size_bytes, 64);
    assert!(!info.continuation_volume);
    assert_eq!(info.path, path);
}

#[test]
fn test_probe_marks_rar_continuation_volumes() {
    let dir = TempDir::new().unwrap();
    let primary = write_file(&dir, "movie.rar", b"x");
    let second = write_file(&dir, "movie.r00", b"x");
    let third = write_file(&dir, "movie.R01", b"x");

    assert!(!probe(&primary).unwrap().continuation_volume);
    assert!(probe(&second).unwrap().continuation_volume);
    assert!(probe(&third).unwrap().continuation_volume);
    assert_eq!(probe(&third).unwrap().format, ArchiveFormat::Rar);
}

#[test]
fn test_probe_rejects_non_archive() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "readme.md", b"# hi");

    assert!(matches!(
        probe(&path),
        Err(ExtractError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_probe_serializes_camel_case() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "a.7z", b"abc");

    let json = serde_json::to_value(probe(&path).unwrap()).unwrap();

    assert_eq!(json["format"], "sevenzip");
    assert_eq!(json["sizeBytes"], 3);
    assert_eq!(json["continuationVolume"], false);
}
