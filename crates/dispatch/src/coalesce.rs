//! Drop split-archive continuation volumes from a task before it is queued.
//!
//! Extracting the primary volume of a split archive (`movie.rar`) already
//! consumes every numbered volume (`movie.r00`, `movie.r01`, ...). Queuing
//! the continuation volumes as archives of their own would extract the set
//! again, or fail on the partial volume.

use crate::config::DEFAULT_SPLIT_VOLUME_PATTERN;
use crate::error::{DispatchError, Result};
use crate::task::ExtractionTask;
use regex::Regex;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Coalescer {
    patterns: Vec<Regex>,
}

impl Default for Coalescer {
    fn default() -> Self {
        Self {
            // The default pattern is a compile-time constant.
            patterns: vec![Regex::new(DEFAULT_SPLIT_VOLUME_PATTERN).expect("valid default pattern")],
        }
    }
}

impl Coalescer {
    /// Build a coalescer from extension patterns. Each pattern is matched
    /// against the file extension including its leading dot (`.r00`).
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| DispatchError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether the path names a continuation volume.
    pub fn is_continuation(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let extension = format!(".{}", extension);
        self.patterns.iter().any(|p| p.is_match(&extension))
    }

    /// Return the task with continuation volumes removed, order preserved.
    pub fn coalesce(&self, mut task: ExtractionTask) -> ExtractionTask {
        task.retain_archives(|job| {
            let keep = !self.is_continuation(&job.archive_path);
            if !keep {
                tracing::debug!(
                    archive = %job.archive_path.display(),
                    "dropping split-volume continuation"
                );
            }
            keep
        });
        task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive_names(task: &ExtractionTask) -> Vec<String> {
        task.archives()
            .iter()
            .map(|job| job.archive_path.display().to_string())
            .collect()
    }

    #[test]
    fn drops_old_style_rar_volumes() {
        let mut task = ExtractionTask::new("show", true);
        for name in ["a.rar", "a.r00", "a.r01", "b.zip"] {
            task.add_archive(format!("/l/show/{}", name), "/o/show");
        }

        let task = Coalescer::default().coalesce(task);

        assert_eq!(archive_names(&task), ["/l/show/a.rar", "/l/show/b.zip"]);
    }

    #[test]
    fn default_pattern_edges() {
        let coalescer = Coalescer::default();
        assert!(coalescer.is_continuation(Path::new("x.R00")));
        assert!(coalescer.is_continuation(Path::new("x.r123")));
        assert!(!coalescer.is_continuation(Path::new("x.r0")));
        assert!(!coalescer.is_continuation(Path::new("x.rar")));
        assert!(!coalescer.is_continuation(Path::new("x.r0a")));
        assert!(!coalescer.is_continuation(Path::new("r00")));
    }

    #[test]
    fn custom_patterns_extend_the_convention() {
        let coalescer =
            Coalescer::new(&[DEFAULT_SPLIT_VOLUME_PATTERN, r"^\.(00[2-9]|0[1-9]\d)$"]).unwrap();

        assert!(coalescer.is_continuation(Path::new("x.7z.002")));
        assert!(!coalescer.is_continuation(Path::new("x.7z.001")));
        assert!(coalescer.is_continuation(Path::new("x.r05")));
    }

    #[test]
    fn no_patterns_keeps_everything() {
        let coalescer = Coalescer::new::<&str>(&[]).unwrap();
        let mut task = ExtractionTask::new("d", true);
        task.add_archive("/l/d/a.r00", "/o/d");

        assert_eq!(coalescer.coalesce(task).archives().len(), 1);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = Coalescer::new(&["(unclosed"]).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidPattern { .. }));
    }
}
