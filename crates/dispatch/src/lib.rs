//! # Extract Dispatch
//!
//! Asynchronous archive-extraction dispatcher.
//!
//! Callers submit a file or a directory tree; the dispatcher collects the
//! archives to extract, queues one task per submission, and a single
//! background worker extracts them strictly in submission order.
//! Registered [`ExtractListener`]s hear about every task that completes or
//! fails.
//!
//! - Duplicate submissions (same root name while queued or in progress) are
//!   ignored, not rejected.
//! - Continuation volumes of split archives (`.r00`, `.r01`, ...) are
//!   dropped from directory submissions, since extracting the primary
//!   volume covers them.
//! - [`Dispatcher::stop`] waits for the extraction in progress, abandons the
//!   rest of that task, and leaves the remaining queue untouched.

pub mod coalesce;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod probe;
pub mod queue;
pub mod status;
pub mod task;
pub mod tree;
pub mod worker;

pub use coalesce::Coalescer;
pub use config::{DispatchConfig, DEFAULT_SPLIT_VOLUME_PATTERN};
pub use dispatcher::{Dispatcher, Submission};
pub use error::{DispatchError, Result};
pub use listener::{ExtractListener, ListenerRegistry, Outcome};
pub use probe::{ArchiveProbe, ExtractorProbe};
pub use queue::TaskQueue;
pub use status::{ExtractState, ExtractStatus};
pub use task::{ArchiveJob, ExtractionTask};
pub use tree::{FileEntry, FileTree};
pub use worker::{Worker, WorkerState};
