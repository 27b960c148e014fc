//! Per-name readiness state.
//!
//! A name moves forward only: `Unrequested → Loading → Ready`, or from any
//! non-ready state to `Failed`. Names that are `Loading` carry the set of
//! injections still outstanding and whether they are still held back by a
//! gate (declared dependencies, or a callback that has not run yet).

use std::collections::{HashMap, HashSet};

use crate::core::DependsError;

/// Identity of one injection.
///
/// Outstanding sets hold ids rather than locators so that the same locator
/// injected twice is tracked as two separate loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

/// Readiness of a name as observed from outside the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Never requested.
    Unrequested,
    /// Requested; resources or dependencies are still outstanding.
    Loading,
    /// Own resources loaded and every dependency ready.
    Ready,
    /// Can never become ready.
    Failed(DependsError),
}

#[derive(Debug, Default)]
struct Loading {
    outstanding: HashSet<ResourceId>,
    gated: bool,
}

#[derive(Debug)]
enum Slot {
    Loading(Loading),
    Ready,
    Failed(DependsError),
}

/// Readiness state for every requested name.
#[derive(Debug, Default)]
pub struct ReadinessTracker {
    slots: HashMap<String, Slot>,
    next_id: u64,
}

impl ReadinessTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `name`.
    pub fn state(&self, name: &str) -> Readiness {
        match self.slots.get(name) {
            None => Readiness::Unrequested,
            Some(Slot::Loading(_)) => Readiness::Loading,
            Some(Slot::Ready) => Readiness::Ready,
            Some(Slot::Failed(error)) => Readiness::Failed(error.clone()),
        }
    }

    /// Whether `name` has been requested at all.
    pub fn is_tracked(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Whether `name` is ready.
    pub fn is_ready(&self, name: &str) -> bool {
        matches!(self.slots.get(name), Some(Slot::Ready))
    }

    /// Whether every name in `names` is ready.
    pub fn are_ready<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().all(|name| self.is_ready(name.as_ref()))
    }

    /// Failure recorded for `name`, if it failed.
    pub fn failure(&self, name: &str) -> Option<&DependsError> {
        match self.slots.get(name) {
            Some(Slot::Failed(error)) => Some(error),
            _ => None,
        }
    }

    /// First name in `names` that failed, with its error.
    pub fn first_failure<'a, S: AsRef<str>>(
        &'a self,
        names: &'a [S],
    ) -> Option<(&'a str, &'a DependsError)> {
        names.iter().find_map(|name| {
            let name = name.as_ref();
            self.failure(name).map(|error| (name, error))
        })
    }

    /// Start tracking `name` as loading.
    ///
    /// Gated names cannot become ready until [`open_gate`](Self::open_gate)
    /// or [`mark_ready`](Self::mark_ready) is called. Returns `false` if the
    /// name was already tracked, in which case nothing changes.
    pub fn begin(&mut self, name: &str, gated: bool) -> bool {
        if self.is_tracked(name) {
            return false;
        }
        self.slots.insert(
            name.to_string(),
            Slot::Loading(Loading {
                outstanding: HashSet::new(),
                gated,
            }),
        );
        true
    }

    /// Allow `name` to become ready once its outstanding set drains.
    pub fn open_gate(&mut self, name: &str) {
        if let Some(Slot::Loading(loading)) = self.slots.get_mut(name) {
            loading.gated = false;
        }
    }

    /// Allocate an id for a new injection owned by `name`.
    ///
    /// The id joins the outstanding set only while `name` is loading; for a
    /// name that already settled the injection is not tracked.
    pub fn track_resource(&mut self, name: &str) -> ResourceId {
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        if let Some(Slot::Loading(loading)) = self.slots.get_mut(name) {
            loading.outstanding.insert(id);
        }
        id
    }

    /// Number of injections `name` is still waiting on.
    pub fn outstanding(&self, name: &str) -> usize {
        match self.slots.get(name) {
            Some(Slot::Loading(loading)) => loading.outstanding.len(),
            _ => 0,
        }
    }

    /// Record that injection `id` of `name` completed.
    ///
    /// Returns `true` if this moved `name` to ready.
    pub fn settle(&mut self, name: &str, id: ResourceId) -> bool {
        if let Some(Slot::Loading(loading)) = self.slots.get_mut(name) {
            loading.outstanding.remove(&id);
        }
        self.try_promote(name)
    }

    /// Move `name` to ready if nothing holds it back.
    ///
    /// Returns `true` on transition.
    pub fn try_promote(&mut self, name: &str) -> bool {
        match self.slots.get(name) {
            Some(Slot::Loading(loading)) if !loading.gated && loading.outstanding.is_empty() => {
                self.slots.insert(name.to_string(), Slot::Ready);
                tracing::debug!("'{}' is ready", name);
                true
            }
            _ => false,
        }
    }

    /// Move `name` to ready regardless of outstanding injections.
    ///
    /// Failed names stay failed. Returns `true` on transition.
    pub fn mark_ready(&mut self, name: &str) -> bool {
        match self.slots.get(name) {
            Some(Slot::Ready | Slot::Failed(_)) => false,
            _ => {
                self.slots.insert(name.to_string(), Slot::Ready);
                tracing::debug!("'{}' is ready", name);
                true
            }
        }
    }

    /// Move `name` to failed.
    ///
    /// Ready names never regress, and the first failure of a name wins.
    /// Returns `true` on transition.
    pub fn fail(&mut self, name: &str, error: DependsError) -> bool {
        match self.slots.get(name) {
            Some(Slot::Ready | Slot::Failed(_)) => false,
            _ => {
                tracing::debug!("'{}' failed: {}", name, error);
                self.slots.insert(name.to_string(), Slot::Failed(error));
                true
            }
        }
    }

    /// Number of tracked names.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no name is tracked.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Forget every name.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
