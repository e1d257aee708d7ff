//! Type definitions for archive extraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Archive container formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    SevenZip,
    Rar,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveFormat::Zip => "ZIP",
            ArchiveFormat::Tar => "TAR",
            ArchiveFormat::TarGz => "TAR.GZ",
            ArchiveFormat::TarBz2 => "TAR.BZ2",
            ArchiveFormat::SevenZip => "7Z",
            ArchiveFormat::Rar => "RAR",
        };
        f.write_str(name)
    }
}

/// Metadata about an archive file on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveInfo {
    /// Path that was probed
    pub path: PathBuf,

    /// Detected container format
    pub format: ArchiveFormat,

    /// Size of the archive file in bytes
    pub size_bytes: u64,

    /// Whether this file is a numbered continuation of a split archive
    /// (`.r00`, `.part2.rar`, `.7z.002`). Extracting the first volume
    /// consumes these.
    pub continuation_volume: bool,
}

/// Options for extracting an archive.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// How to handle file conflicts during extraction
    pub overwrite: OverwriteMode,

    /// Maximum total extracted size in bytes (default: 20 GB)
    pub size_limit_bytes: Option<u64>,

    /// Whether to allow extraction of symbolic links
    pub allow_symlinks: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            overwrite: OverwriteMode::Replace,
            size_limit_bytes: Some(20 * 1024 * 1024 * 1024), // 20 GB
            allow_symlinks: false,
        }
    }
}

/// How to handle file conflicts during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteMode {
    /// Replace existing files
    Replace,

    /// Skip files that already exist
    Skip,

    /// Rename new files by appending (1), (2), etc.
    Rename,
}

impl FromStr for OverwriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "replace" => Ok(OverwriteMode::Replace),
            "skip" => Ok(OverwriteMode::Skip),
            "rename" => Ok(OverwriteMode::Rename),
            other => Err(format!("unknown overwrite mode: {}", other)),
        }
    }
}

/// Statistics about a completed extraction operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractStats {
    /// Number of files written
    pub files_extracted: u64,

    /// Total bytes written to disk
    pub bytes_written: u64,

    /// Entries skipped because of overwrite mode or entry policy
    pub entries_skipped: u64,

    /// Duration of the extraction operation (in milliseconds)
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_mode_parses_case_insensitively() {
        assert_eq!("Skip".parse::<OverwriteMode>(), Ok(OverwriteMode::Skip));
        assert_eq!("rename".parse::<OverwriteMode>(), Ok(OverwriteMode::Rename));
        assert!("merge".parse::<OverwriteMode>().is_err());
    }

    #[test]
    fn stats_serialize_duration_as_millis() {
        let stats = ExtractStats {
            files_extracted: 2,
            bytes_written: 10,
            entries_skipped: 0,
            duration: Duration::from_millis(1500),
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["duration"], 1500);
        assert_eq!(json["filesExtracted"], 2);
    }
}
