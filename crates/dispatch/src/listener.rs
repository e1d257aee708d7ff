//! Observers of task outcomes.

use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Receives one notification per processed task.
///
/// Callbacks run synchronously on the worker thread while the registry lock
/// is held: a slow listener delays the next task, and a listener must not
/// call [`Dispatcher::add_listener`](crate::Dispatcher::add_listener).
pub trait ExtractListener: Send + Sync {
    /// Every archive of the task was extracted.
    fn extract_completed(&self, name: &str, is_dir: bool);

    /// An archive failed to extract, or shutdown interrupted the task.
    fn extract_failed(&self, name: &str, is_dir: bool);
}

/// How a task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
}

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Arc<dyn ExtractListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn ExtractListener>) {
        self.listeners.lock().push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Notify every listener, holding the lock for the whole batch.
    ///
    /// A panicking listener is logged and does not stop the others.
    pub fn notify(&self, name: &str, is_dir: bool, outcome: Outcome) {
        let listeners = self.listeners.lock();
        for listener in listeners.iter() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| match outcome {
                Outcome::Completed => listener.extract_completed(name, is_dir),
                Outcome::Failed => listener.extract_failed(name, is_dir),
            }));
            if delivered.is_err() {
                tracing::error!(name, ?outcome, "extract listener panicked");
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, bool, Outcome)>>,
    }

    impl ExtractListener for Recorder {
        fn extract_completed(&self, name: &str, is_dir: bool) {
            self.events
                .lock()
                .push((name.to_string(), is_dir, Outcome::Completed));
        }

        fn extract_failed(&self, name: &str, is_dir: bool) {
            self.events
                .lock()
                .push((name.to_string(), is_dir, Outcome::Failed));
        }
    }

    #[test]
    fn every_listener_gets_the_outcome() {
        let registry = ListenerRegistry::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        registry.add(first.clone());
        registry.add(second.clone());

        registry.notify("show", true, Outcome::Failed);
        registry.notify("a.zip", false, Outcome::Completed);

        for recorder in [&first, &second] {
            assert_eq!(
                *recorder.events.lock(),
                vec![
                    ("show".to_string(), true, Outcome::Failed),
                    ("a.zip".to_string(), false, Outcome::Completed),
                ]
            );
        }
    }

    struct Panicky;

    impl ExtractListener for Panicky {
        fn extract_completed(&self, _name: &str, _is_dir: bool) {
            panic!("listener bug");
        }

        fn extract_failed(&self, _name: &str, _is_dir: bool) {}
    }

    #[test]
    fn panicking_listener_does_not_starve_the_rest() {
        let registry = ListenerRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.add(Arc::new(Panicky));
        registry.add(recorder.clone());

        registry.notify("a.zip", false, Outcome::Completed);

        assert_eq!(recorder.events.lock().len(), 1);
    }

    #[test]
    fn notify_without_listeners_is_a_no_op() {
        let registry = ListenerRegistry::new();
        registry.notify("x", false, Outcome::Completed);
        assert!(registry.is_empty());
    }
}
