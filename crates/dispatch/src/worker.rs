//! The single background thread that drains the task queue.
//!
//! Tasks are processed strictly in queue order, one archive at a time.
//! Shutdown is cooperative: it is checked before each archive and before
//! each task, never in the middle of an extraction call.

use crate::error::{DispatchError, Result};
use crate::listener::{ListenerRegistry, Outcome};
use crate::probe::ArchiveProbe;
use crate::queue::TaskQueue;
use crate::task::ExtractionTask;
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const WORKER_THREAD_NAME: &str = "extract-worker";

/// Lifecycle of the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Stopped,
    Running,
    ShuttingDown,
}

/// State shared between the worker thread and its owner.
struct Shared {
    queue: Arc<TaskQueue>,
    listeners: Arc<ListenerRegistry>,
    probe: Arc<dyn ArchiveProbe>,
    poll_interval: Duration,
    shutdown: AtomicBool,
    /// Set when there may be new work; guarded so a wake-up between the
    /// queue check and the wait is never lost.
    wake_pending: Mutex<bool>,
    wake_signal: Condvar,
}

impl Shared {
    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn wake(&self) {
        *self.wake_pending.lock() = true;
        self.wake_signal.notify_one();
    }

    fn run(&self) {
        debug!("extraction worker started");

        while !self.shutdown_requested() {
            while !self.shutdown_requested() {
                let Some(task) = self.queue.peek_head() else {
                    break;
                };
                self.process(&task);
            }
            self.wait_for_work();
        }

        debug!("extraction worker exiting");
    }

    /// Idle until woken by an enqueue or stop, or the poll interval passes.
    fn wait_for_work(&self) {
        let mut pending = self.wake_pending.lock();
        if !*pending && !self.shutdown_requested() {
            self.wake_signal.wait_for(&mut pending, self.poll_interval);
        }
        *pending = false;
    }

    fn process(&self, task: &ExtractionTask) {
        let outcome = {
            // The head is removed exactly once however extraction ends.
            let _pop = scopeguard::guard(&*self.queue, |queue| {
                queue.remove_head();
            });
            self.extract_all(task)
        };

        match outcome {
            Outcome::Completed => info!(name = task.root_name(), "extraction completed"),
            Outcome::Failed => warn!(name = task.root_name(), "extraction failed"),
        }
        self.listeners.notify(task.root_name(), task.root_is_dir(), outcome);
    }

    /// Extract every archive of the task in order, stopping at the first
    /// failure or at a shutdown request.
    fn extract_all(&self, task: &ExtractionTask) -> Outcome {
        for job in task.archives() {
            if self.shutdown_requested() {
                warn!(
                    name = task.root_name(),
                    "extraction interrupted, shutdown requested"
                );
                return Outcome::Failed;
            }

            debug!(
                name = task.root_name(),
                archive = %job.archive_path.display(),
                output = %job.output_dir.display(),
                "extracting"
            );

            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                self.probe.extract(&job.archive_path, &job.output_dir)
            }));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(
                        name = task.root_name(),
                        archive = %job.archive_path.display(),
                        error = %e,
                        "caught an extraction error"
                    );
                    return Outcome::Failed;
                }
                Err(_) => {
                    error!(
                        name = task.root_name(),
                        archive = %job.archive_path.display(),
                        "extraction panicked"
                    );
                    return Outcome::Failed;
                }
            }
        }
        Outcome::Completed
    }
}

struct Lifecycle {
    state: WorkerState,
    handle: Option<JoinHandle<()>>,
    /// Kept after the handle is taken so a stop from a listener is still
    /// recognised while another caller joins.
    thread_id: Option<ThreadId>,
}

impl Lifecycle {
    fn on_worker_thread(&self) -> bool {
        self.thread_id == Some(thread::current().id())
    }
}

/// Owner of the worker thread.
pub struct Worker {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
    /// Signalled when a stop finishes joining the thread.
    stopped: Condvar,
}

impl Worker {
    pub fn new(
        queue: Arc<TaskQueue>,
        listeners: Arc<ListenerRegistry>,
        probe: Arc<dyn ArchiveProbe>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue,
                listeners,
                probe,
                poll_interval,
                shutdown: AtomicBool::new(false),
                wake_pending: Mutex::new(false),
                wake_signal: Condvar::new(),
            }),
            lifecycle: Mutex::new(Lifecycle {
                state: WorkerState::Stopped,
                handle: None,
                thread_id: None,
            }),
            stopped: Condvar::new(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.lock().state
    }

    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// [`DispatchError::AlreadyRunning`] if the worker is running or still
    /// shutting down, [`DispatchError::Io`] if the thread cannot be spawned.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        let state = lifecycle.state;
        match state {
            WorkerState::Running => return Err(DispatchError::AlreadyRunning),
            WorkerState::ShuttingDown => {
                // Left behind by a stop() issued from the worker thread itself.
                let previous = lifecycle.handle.take();
                match previous {
                    Some(handle) if handle.is_finished() => {
                        if handle.join().is_err() {
                            error!("extraction worker panicked");
                        }
                    }
                    previous => {
                        lifecycle.handle = previous;
                        return Err(DispatchError::AlreadyRunning);
                    }
                }
            }
            WorkerState::Stopped => {}
        }

        self.shared.shutdown.store(false, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || shared.run())?;

        lifecycle.state = WorkerState::Running;
        lifecycle.thread_id = Some(handle.thread().id());
        lifecycle.handle = Some(handle);
        info!("extraction worker started");
        Ok(())
    }

    /// Request shutdown and block until the worker thread has exited.
    ///
    /// An extraction in progress runs to completion first; the rest of its
    /// task is abandoned and reported as failed. Tasks still queued stay
    /// queued. Concurrent callers all wait for the same exit. Called from
    /// the worker thread (from a listener), this only requests shutdown.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        let Some(handle) = lifecycle.handle.take() else {
            // Another caller is already joining the thread.
            if !lifecycle.on_worker_thread() {
                while lifecycle.state == WorkerState::ShuttingDown {
                    self.stopped.wait(&mut lifecycle);
                }
            }
            return;
        };

        lifecycle.state = WorkerState::ShuttingDown;
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.wake();

        if lifecycle.on_worker_thread() {
            warn!("stop requested from the extraction worker, not waiting for it");
            lifecycle.handle = Some(handle);
            return;
        }

        // Listeners may query the state while we wait.
        drop(lifecycle);
        if handle.join().is_err() {
            error!("extraction worker panicked");
        }

        let mut lifecycle = self.lifecycle.lock();
        lifecycle.state = WorkerState::Stopped;
        lifecycle.thread_id = None;
        self.stopped.notify_all();
        info!("extraction worker stopped");
    }

    /// Wake the idle worker so it notices new work before the poll interval.
    pub fn notify_enqueued(&self) {
        self.shared.wake();
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("state", &self.state())
            .field("poll_interval", &self.shared.poll_interval)
            .finish()
    }
}
