//! Test utilities for depends
//!
//! This module provides an injector that records every injection and lets a
//! test decide when, in which order and with which outcome each one
//! completes, plus logging setup shared by unit and integration tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use depends::resolver::Depends;
//! use depends::test_utils::RecordingInjector;
//!
//! let injector = RecordingInjector::new();
//! let depends = Depends::new(injector.clone());
//! depends.register([("jquery", "jquery.js")]);
//! depends.ensure("jquery");
//!
//! assert_eq!(injector.injected(), vec!["jquery.js"]);
//! assert!(injector.complete("jquery.js"));
//! assert!(depends.is_ready("jquery"));
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::injector::{Completion, Injector, Resource};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. The provided level wins over
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=depends=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

#[derive(Default)]
struct Recording {
    injected: Vec<Resource>,
    waiting: Vec<(Resource, Completion)>,
}

/// Injector that holds every completion until the test fires it.
///
/// Clones share the same recording, so a test keeps one clone and hands the
/// other to the resolver. Resources are addressed by label, which is the
/// locator when one is present.
#[derive(Clone, Default)]
pub struct RecordingInjector {
    recording: Rc<RefCell<Recording>>,
}

impl RecordingInjector {
    /// Create an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels of every injection so far, in injection order.
    pub fn injected(&self) -> Vec<String> {
        self.recording.borrow().injected.iter().map(Resource::label).collect()
    }

    /// Every injected resource so far, in injection order.
    pub fn resources(&self) -> Vec<Resource> {
        self.recording.borrow().injected.clone()
    }

    /// How many times `label` was injected.
    pub fn count(&self, label: &str) -> usize {
        self.recording.borrow().injected.iter().filter(|resource| resource.label() == label).count()
    }

    /// Labels of injections whose completion has not been fired yet.
    pub fn waiting(&self) -> Vec<String> {
        self.recording.borrow().waiting.iter().map(|(resource, _)| resource.label()).collect()
    }

    /// Remove the oldest unfired completion for `label`.
    pub fn take_completion(&self, label: &str) -> Option<Completion> {
        let mut recording = self.recording.borrow_mut();
        let position = recording.waiting.iter().position(|(resource, _)| resource.label() == label)?;
        Some(recording.waiting.remove(position).1)
    }

    /// Fire the oldest unfired completion for `label` as loaded.
    pub fn complete(&self, label: &str) -> bool {
        match self.take_completion(label) {
            Some(completion) => {
                completion.complete();
                true
            }
            None => false,
        }
    }

    /// Fire the oldest unfired completion for `label` as failed.
    pub fn fail(&self, label: &str, reason: &str) -> bool {
        match self.take_completion(label) {
            Some(completion) => {
                completion.fail(reason);
                true
            }
            None => false,
        }
    }

    /// Complete everything, oldest first, including injections started by
    /// earlier completions. Returns the number fired.
    pub fn complete_all(&self) -> usize {
        self.complete_until_idle(|waiting| if waiting.is_empty() { None } else { Some(0) })
    }

    /// Like [`complete_all`](Self::complete_all), newest first.
    pub fn complete_all_reversed(&self) -> usize {
        self.complete_until_idle(|waiting| waiting.len().checked_sub(1))
    }

    fn complete_until_idle(&self, pick: impl Fn(&[(Resource, Completion)]) -> Option<usize>) -> usize {
        let mut fired = 0;
        loop {
            let next = {
                let mut recording = self.recording.borrow_mut();
                match pick(&recording.waiting) {
                    Some(index) => recording.waiting.remove(index).1,
                    None => break,
                }
            };
            next.complete();
            fired += 1;
        }
        fired
    }
}

impl Injector for RecordingInjector {
    fn inject(&self, resource: &Resource, completion: Completion) {
        let mut recording = self.recording.borrow_mut();
        recording.injected.push(resource.clone());
        recording.waiting.push((resource.clone(), completion));
    }
}

impl std::fmt::Debug for RecordingInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let recording = self.recording.borrow();
        f.debug_struct("RecordingInjector")
            .field("injected", &recording.injected.len())
            .field("waiting", &recording.waiting.len())
            .finish()
    }
}
