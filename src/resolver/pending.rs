//! Queue of work waiting for a set of names to become ready.
//!
//! Draining never pops and re-pushes entries in place. Each pass takes the
//! whole queue, partitions it against the tracker into entries that can fire,
//! entries that can never fire because a requirement failed, and entries that
//! keep waiting. The waiting entries go back in their original relative order
//! before anything fires, so callbacks that enqueue more work or trigger
//! nested drains see a consistent queue and no entry can run twice.

use std::fmt;
use tokio::sync::oneshot;

use super::tracker::ReadinessTracker;
use crate::core::DependsError;
use crate::registry::Assets;

/// What to do when an entry's requirements are met.
pub(crate) enum Action {
    /// Run a user callback.
    Callback(Box<dyn FnOnce()>),
    /// Inject the held-back resources of a name whose dependencies are ready.
    Release {
        name: String,
        assets: Assets,
    },
    /// Resolve an async waiter.
    Notify(oneshot::Sender<Result<(), DependsError>>),
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("Callback"),
            Self::Release { name, .. } => write!(f, "Release({name})"),
            Self::Notify(_) => f.write_str("Notify"),
        }
    }
}

/// Deferred work gated on a set of names.
#[derive(Debug)]
pub(crate) struct PendingEntry {
    /// Name marked ready when the entry fires, if any.
    pub name: Option<String>,
    /// Names that must all be ready.
    pub required: Vec<String>,
    pub action: Action,
}

impl PendingEntry {
    pub fn new(name: Option<String>, required: Vec<String>, action: Action) -> Self {
        Self {
            name,
            required,
            action,
        }
    }

    /// Name used when reporting on this entry.
    pub fn label(&self) -> &str {
        match (&self.name, &self.action) {
            (Some(name), _) | (None, Action::Release { name, .. }) => name.as_str(),
            (None, _) => "<anonymous>",
        }
    }
}

/// An entry that can never fire, with the requirement that broke it.
#[derive(Debug)]
pub(crate) struct Rejected {
    pub entry: PendingEntry,
    pub dependency: String,
    pub error: DependsError,
}

/// Result of one drain pass.
#[derive(Debug, Default)]
pub(crate) struct Partition {
    pub ready: Vec<PendingEntry>,
    pub rejected: Vec<Rejected>,
}

impl Partition {
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty() && self.rejected.is_empty()
    }
}

/// Ordered queue of pending entries.
#[derive(Debug, Default)]
pub(crate) struct PendingQueue {
    entries: Vec<PendingEntry>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PendingEntry) {
        tracing::trace!("Queueing {:?} until {:?} are ready", entry.action, entry.required);
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry whose requirements are settled.
    ///
    /// Waiting entries stay queued in their original order. Entries are
    /// returned front to back.
    pub fn partition(&mut self, tracker: &ReadinessTracker) -> Partition {
        let mut partition = Partition::default();
        let snapshot = std::mem::take(&mut self.entries);

        for entry in snapshot {
            if let Some((dependency, error)) = tracker.first_failure(entry.required.as_slice()) {
                let dependency = dependency.to_string();
                let error = error.clone();
                partition.rejected.push(Rejected {
                    entry,
                    dependency,
                    error,
                });
            } else if tracker.are_ready(entry.required.as_slice()) {
                partition.ready.push(entry);
            } else {
                self.entries.push(entry);
            }
        }

        partition
    }

    /// Remove and return every entry.
    pub fn take_all(&mut self) -> Vec<PendingEntry> {
        std::mem::take(&mut self.entries)
    }
}
