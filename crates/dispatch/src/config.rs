//! Dispatcher configuration, persisted as JSON.

use crate::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extension pattern for old-style RAR continuation volumes (`.r00`, `.r01`, ...).
pub const DEFAULT_SPLIT_VOLUME_PATTERN: &str = r"(?i)^\.r\d{2,}$";

/// Settings for an [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatchConfig {
    /// Root directory that file tree paths are relative to
    pub local_dir: PathBuf,

    /// Root directory extracted files are written under
    pub output_dir: PathBuf,

    /// Upper bound on how long an idle worker waits before re-checking the queue
    pub poll_interval_ms: u64,

    /// Regexes matched against a file's extension (with the leading dot).
    /// Matching archives are treated as continuation volumes and dropped
    /// from directory submissions.
    pub split_volume_patterns: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            local_dir: PathBuf::from("."),
            output_dir: PathBuf::from("extracted"),
            poll_interval_ms: 500,
            split_volume_patterns: vec![DEFAULT_SPLIT_VOLUME_PATTERN.to_string()],
        }
    }
}

impl DispatchConfig {
    /// Config rooted at the given local and output directories, defaults otherwise.
    pub fn new(local_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            local_dir: local_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject settings the dispatcher cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(DispatchError::Config(
                "pollIntervalMs must be greater than zero".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(DispatchError::Config("outputDir must not be empty".to_string()));
        }
        Ok(())
    }

    /// Load settings from a JSON file.
    ///
    /// A missing file yields the defaults. A file that cannot be parsed is
    /// logged and also yields the defaults, so a corrupted settings file
    /// never prevents startup.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        match serde_json::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let config = DispatchConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.split_volume_patterns, vec![DEFAULT_SPLIT_VOLUME_PATTERN]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = DispatchConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, DispatchConfig::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dispatch.json");
        let mut config = DispatchConfig::new("/srv/local", "/srv/out");
        config.poll_interval_ms = 50;

        config.save(&path).unwrap();

        assert_eq!(DispatchConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dispatch.json");
        fs::write(&path, r#"{"outputDir": "/data/out"}"#).unwrap();

        let config = DispatchConfig::load(&path).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/data/out"));
        assert_eq!(config.poll_interval_ms, 500);
    }

    #[test]
    fn corrupted_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dispatch.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(DispatchConfig::load(&path).unwrap(), DispatchConfig::default());
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = DispatchConfig {
            poll_interval_ms: 0,
            ..DispatchConfig::default()
        };
        assert!(matches!(config.validate(), Err(DispatchError::Config(_))));
    }
}
