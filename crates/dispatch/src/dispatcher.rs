//! The public facade: submission, status, listeners and worker lifecycle.

use crate::coalesce::Coalescer;
use crate::config::DispatchConfig;
use crate::error::{DispatchError, Result};
use crate::listener::{ExtractListener, ListenerRegistry};
use crate::probe::{ArchiveProbe, ExtractorProbe};
use crate::queue::TaskQueue;
use crate::status::ExtractStatus;
use crate::task::ExtractionTask;
use crate::tree::FileTree;
use crate::worker::{Worker, WorkerState};
use extractor::ExtractOptions;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// What happened to a submission that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A new task was queued.
    Queued,
    /// A task with the same name is already queued or in progress.
    Ignored,
}

/// Accepts extraction requests and runs them one at a time on a
/// background worker.
///
/// ```no_run
/// use extract_dispatch::{DispatchConfig, Dispatcher, FileEntry};
/// use extractor::ExtractOptions;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DispatchConfig::new("/downloads", "/extracted");
/// let dispatcher = Dispatcher::with_extractor(config, ExtractOptions::default())?;
/// dispatcher.start()?;
///
/// let show = FileEntry::scan(Path::new("/downloads"), Path::new("show"))?;
/// dispatcher.submit(&show)?;
/// for status in dispatcher.status() {
///     println!("{} {:?}", status.name, status.state);
/// }
///
/// dispatcher.stop();
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    config: DispatchConfig,
    queue: Arc<TaskQueue>,
    listeners: Arc<ListenerRegistry>,
    probe: Arc<dyn ArchiveProbe>,
    coalescer: Coalescer,
    worker: Worker,
}

impl Dispatcher {
    /// Create a stopped dispatcher.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or a split-volume pattern does
    /// not compile.
    pub fn new(config: DispatchConfig, probe: Arc<dyn ArchiveProbe>) -> Result<Self> {
        config.validate()?;
        let coalescer = Coalescer::new(&config.split_volume_patterns)?;
        let queue = Arc::new(TaskQueue::new());
        let listeners = Arc::new(ListenerRegistry::new());
        let worker = Worker::new(
            Arc::clone(&queue),
            Arc::clone(&listeners),
            Arc::clone(&probe),
            config.poll_interval(),
        );

        Ok(Self {
            config,
            queue,
            listeners,
            probe,
            coalescer,
            worker,
        })
    }

    /// Create a dispatcher backed by the `extractor` crate.
    pub fn with_extractor(config: DispatchConfig, options: ExtractOptions) -> Result<Self> {
        Self::new(config, Arc::new(ExtractorProbe::new(options)))
    }

    /// The validated configuration this dispatcher runs with.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Start the background worker. Tasks already queued are processed.
    pub fn start(&self) -> Result<()> {
        self.worker.start()
    }

    /// Stop the background worker and wait for it to exit.
    ///
    /// Queued tasks are kept, not drained; a later `start` resumes them.
    pub fn stop(&self) {
        self.worker.stop()
    }

    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }

    pub fn is_running(&self) -> bool {
        self.worker.state() == WorkerState::Running
    }

    pub fn add_listener(&self, listener: Arc<dyn ExtractListener>) {
        self.listeners.add(listener);
    }

    /// Every queued or in-progress request, oldest first.
    pub fn status(&self) -> Vec<ExtractStatus> {
        self.queue
            .snapshot()
            .iter()
            .map(|task| ExtractStatus::extracting(task.root_name(), task.root_is_dir()))
            .collect()
    }

    /// Request extraction of a file or of every archive under a directory.
    ///
    /// Submitting a name that is already queued or in progress is ignored.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NoArchivesFound`] for a directory with no
    ///   eligible archive
    /// - [`DispatchError::NotLocallyAvailable`] for a file with no known
    ///   local size, or size zero
    /// - [`DispatchError::NotAnArchive`] for a file the probe rejects
    ///
    /// Nothing is queued when an error is returned.
    pub fn submit<N: FileTree>(&self, node: &N) -> Result<Submission> {
        let name = node.name();
        debug!(name, is_dir = node.is_dir(), "received extract request");

        if self.queue.contains(name) {
            info!(name, "ignoring extract request, already queued");
            return Ok(Submission::Ignored);
        }

        let task = if node.is_dir() {
            self.directory_task(node)?
        } else {
            self.file_task(node)?
        };
        let archive_count = task.archives().len();

        if !self.queue.enqueue_unique(task) {
            info!(name, "ignoring extract request, already queued");
            return Ok(Submission::Ignored);
        }
        self.worker.notify_enqueued();

        info!(name, archives = archive_count, "queued extract request");
        Ok(Submission::Queued)
    }

    /// Breadth-first walk collecting every local archive under `root`.
    fn directory_task<N: FileTree>(&self, root: &N) -> Result<ExtractionTask> {
        let mut task = ExtractionTask::new(root.name(), true);
        let mut frontier: VecDeque<&N> = VecDeque::from([root]);

        while let Some(node) = frontier.pop_front() {
            if node.is_dir() {
                frontier.extend(node.children());
                continue;
            }

            let archive_path = self.config.local_dir.join(node.full_path());
            if is_locally_available(node) && self.probe.is_archive(&archive_path) {
                task.add_archive(archive_path, self.mirrored_output_dir(node));
            }
        }

        let task = self.coalescer.coalesce(task);
        if task.archives().is_empty() {
            return Err(DispatchError::NoArchivesFound(root.name().to_string()));
        }
        Ok(task)
    }

    fn file_task<N: FileTree>(&self, node: &N) -> Result<ExtractionTask> {
        if !is_locally_available(node) {
            return Err(DispatchError::NotLocallyAvailable(node.name().to_string()));
        }

        let archive_path = self.config.local_dir.join(node.full_path());
        if !self.probe.is_archive(&archive_path) {
            return Err(DispatchError::NotAnArchive(node.name().to_string()));
        }

        let mut task = ExtractionTask::new(node.name(), false);
        task.add_archive(archive_path, self.config.output_dir.clone());
        Ok(task)
    }

    /// The output root joined with the directory part of the node's path.
    fn mirrored_output_dir<N: FileTree>(&self, node: &N) -> PathBuf {
        match node.full_path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.config.output_dir.join(parent),
            _ => self.config.output_dir.clone(),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("queued", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

fn is_locally_available<N: FileTree>(node: &N) -> bool {
    node.local_size().map_or(false, |size| size > 0)
}
