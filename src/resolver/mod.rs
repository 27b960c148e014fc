//! Dependency resolution and readiness tracking.
//!
//! [`Depends`] expands requested names into their transitive closure, hands
//! every newly discovered resource to the [`Injector`], tracks the injections
//! each name is still waiting on, and drains the queue of deferred work
//! whenever a name changes state.
//!
//! # Resolution Process
//!
//! Requesting a name that is not tracked yet:
//! 1. **Lookup**: read its descriptor; unknown and malformed names are
//!    treated as empty and reported as diagnostics
//! 2. **Cycle check**: optionally fail every name on a cycle reachable from it
//! 3. **Dependencies first**: request each declared dependency, in order
//! 4. **Gate**: a name with dependencies queues its own resources until every
//!    dependency is ready; a name without injects them right away
//! 5. **Readiness**: once every injection of the name has completed, the name
//!    becomes ready and the queue is drained
//!
//! A name that is already loading, ready or failed is never expanded again.
//!
//! # Scheduling Model
//!
//! Everything runs on one thread. The resolver never blocks: waiting is a
//! queue entry, and the only asynchrony comes from injectors firing their
//! completions later, in any order. Completions, callbacks and injectors may
//! all call back into the resolver; no internal borrow is held while user
//! code runs.

pub mod facade;
pub mod graph;
pub(crate) mod pending;
pub mod tracker;

pub use facade::{IntoNames, NO_DEPENDENCIES, Source, WhenReady};
pub use graph::DependencyGraph;
pub use tracker::{Readiness, ReadinessTracker, ResourceId};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use self::pending::{Action, PendingEntry, PendingQueue, Rejected};
use crate::config::ResolverOptions;
use crate::core::{DependsError, Diagnostic, DiagnosticKind};
use crate::injector::{Completion, Injector, Resource, Settle, Settlement};
use crate::registry::{Assets, Lookup, Registry};

/// Mutable resolver state.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub registry: Registry,
    pub tracker: ReadinessTracker,
    pub pending: PendingQueue,
    pub diagnostics: Vec<Diagnostic>,
    /// Bumped by every reset; completions from an older epoch are ignored.
    pub epoch: u64,
}

impl State {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Normalized descriptor for `name`, reporting unknown and malformed names.
    fn assets_for(&mut self, name: &str, options: &ResolverOptions) -> Assets {
        let kind = match self.registry.lookup(name) {
            Lookup::Found(descriptor) => return descriptor.assets(),
            Lookup::Malformed(reason) => {
                tracing::warn!("Invalid descriptor registered for '{}': {}", name, reason);
                DiagnosticKind::MalformedDescriptor {
                    reason: reason.to_string(),
                }
            }
            Lookup::Unknown => {
                let suggestions = self.registry.suggestions(name);
                if options.warn_unknown {
                    tracing::warn!("'{}' is not registered; treating it as empty", name);
                } else {
                    tracing::debug!("'{}' is not registered; treating it as empty", name);
                }
                DiagnosticKind::UnknownName {
                    suggestions,
                }
            }
        };
        self.record(Diagnostic::new(name, kind));
        Assets::default()
    }

    /// Fail every name on a cycle reachable from `name` through names that
    /// are not tracked yet.
    ///
    /// Tracked names are leaves: a cycle through a name that is already
    /// loading or settled cannot stall the request.
    fn fail_cycles(&mut self, name: &str) {
        if self.registry.dependencies_of(name).is_empty() {
            return;
        }

        // failed members are tracked, so each round finds a different cycle
        while !self.tracker.is_tracked(name) {
            let tracker = &self.tracker;
            let graph = DependencyGraph::from_registry_until(&self.registry, &[name], |candidate| {
                tracker.is_tracked(candidate)
            });
            let Some(cycle) = graph.find_cycle() else {
                return;
            };

            let chain = cycle.join(" → ");
            tracing::warn!("Circular dependency detected: {}", chain);
            for member in &cycle[..cycle.len() - 1] {
                let error = DependsError::CircularDependency {
                    chain: chain.clone(),
                };
                if self.tracker.fail(member, error) {
                    self.record(Diagnostic::new(
                        member.as_str(),
                        DiagnosticKind::CircularDependency {
                            chain: cycle.clone(),
                        },
                    ));
                }
            }
        }
    }

    /// Fail `name`, recording a diagnostic on transition.
    fn fail(&mut self, name: &str, error: DependsError) -> bool {
        let transitioned = self.tracker.fail(name, error.clone());
        if transitioned {
            tracing::warn!("{}", error);
            self.record(Diagnostic::new(name, DiagnosticKind::Failed(error)));
        }
        transitioned
    }
}

pub(crate) struct Inner {
    pub state: RefCell<State>,
    injector: Box<dyn Injector>,
    options: ResolverOptions,
}

impl Settle for Inner {
    fn settle(self: Rc<Self>, settlement: Settlement) {
        Depends {
            inner: self,
        }
        .on_settled(settlement);
    }
}

/// Handle to a resolver instance.
///
/// Cloning the handle shares the instance, which lets callbacks capture a
/// handle and call back in. Independent instances share nothing.
#[derive(Clone)]
pub struct Depends {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for Depends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Depends")
            .field("registered", &state.registry.len())
            .field("tracked", &state.tracker.len())
            .field("pending", &state.pending.len())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl Depends {
    /// Create a resolver with default options.
    pub fn new(injector: impl Injector + 'static) -> Self {
        Self::with_options(injector, ResolverOptions::default())
    }

    /// Create a resolver with explicit options.
    pub fn with_options(injector: impl Injector + 'static, options: ResolverOptions) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(State::default()),
                injector: Box::new(injector),
                options,
            }),
        }
    }

    /// Options this resolver was created with.
    pub fn options(&self) -> ResolverOptions {
        self.inner.options
    }

    /// Request one name or a sequence of names.
    ///
    /// Names already loading, ready or failed are skipped. Dependencies are
    /// requested, in declared order, before the name's own resources.
    pub fn ensure(&self, names: impl IntoNames) {
        for name in names.into_names() {
            self.ensure_one(&name, self.inner.options.detect_cycles);
        }
    }

    /// Expand one name. Only the outermost call checks for cycles; the
    /// untracked closure it walked covers every dependency expanded below it.
    fn ensure_one(&self, name: &str, check_cycles: bool) {
        let assets = {
            let mut state = self.inner.state.borrow_mut();
            if state.tracker.is_tracked(name) {
                tracing::trace!("'{}' already requested", name);
                return;
            }
            if check_cycles {
                state.fail_cycles(name);
                if state.tracker.is_tracked(name) {
                    return;
                }
            }
            let assets = state.assets_for(name, &self.inner.options);
            state.tracker.begin(name, !assets.dependencies.is_empty());
            assets
        };

        if assets.dependencies.is_empty() {
            self.inject_assets(name, &assets);
            return;
        }

        tracing::debug!("'{}' waits for {:?}", name, assets.dependencies);
        for dependency in &assets.dependencies {
            self.ensure_one(dependency, false);
        }

        let required = assets.dependencies.clone();
        self.enqueue(PendingEntry::new(
            None,
            required,
            Action::Release {
                name: name.to_string(),
                assets,
            },
        ));
    }

    /// Inject every resource of `name` and promote it if nothing is outstanding.
    fn inject_assets(&self, name: &str, assets: &Assets) {
        let (batch, epoch) = {
            let mut state = self.inner.state.borrow_mut();
            state.tracker.open_gate(name);
            // ids are allocated up front so an injector completing synchronously
            // cannot promote the name before its later resources are tracked
            let batch: Vec<(Resource, ResourceId)> = assets
                .resources()
                .map(|(kind, reference)| {
                    (Resource::new(name, kind, reference.clone()), state.tracker.track_resource(name))
                })
                .collect();
            (batch, state.epoch)
        };

        for (resource, id) in batch {
            self.inject(&resource, id, epoch);
        }

        let promoted = self.inner.state.borrow_mut().tracker.try_promote(name);
        if promoted {
            self.drain();
        }
    }

    /// Hand one resource to the injector.
    pub(crate) fn inject(&self, resource: &Resource, id: ResourceId, epoch: u64) {
        tracing::debug!("Injecting {}", resource);
        let sink: Weak<Inner> = Rc::downgrade(&self.inner);
        let sink: Weak<dyn Settle> = sink;
        let completion = Completion::new(sink, resource, id, epoch);
        self.inner.injector.inject(resource, completion);
    }

    fn on_settled(&self, settlement: Settlement) {
        let Settlement {
            owner,
            label,
            id,
            epoch,
            outcome,
        } = settlement;

        let transitioned = {
            let mut state = self.inner.state.borrow_mut();
            if state.epoch != epoch {
                tracing::trace!("Ignoring completion of '{}' from before a reset", label);
                return;
            }
            match outcome {
                Ok(()) => {
                    tracing::trace!("Loaded '{}' for '{}'", label, owner);
                    state.tracker.settle(&owner, id)
                }
                Err(reason) => state.fail(
                    &owner,
                    DependsError::LoadFailed {
                        name: owner.clone(),
                        resource: label,
                        reason,
                    },
                ),
            }
        };

        if transitioned {
            self.drain();
        }
    }

    /// Queue an entry and give it a chance to fire right away.
    pub(crate) fn enqueue(&self, entry: PendingEntry) {
        self.inner.state.borrow_mut().pending.push(entry);
        self.drain();
    }

    /// Fire or reject every entry whose requirements are settled.
    ///
    /// Repeats until a pass changes nothing, so readiness produced by the
    /// entries of one pass is seen by the next.
    ///
    /// A reset from inside an entry abandons the rest of the pass.
    pub(crate) fn drain(&self) {
        loop {
            let (partition, epoch) = {
                let mut state = self.inner.state.borrow_mut();
                let State {
                    tracker,
                    pending,
                    epoch,
                    ..
                } = &mut *state;
                (pending.partition(tracker), *epoch)
            };
            if partition.is_empty() {
                break;
            }

            tracing::trace!(
                "Drain pass: {} ready, {} rejected",
                partition.ready.len(),
                partition.rejected.len()
            );
            for entry in partition.rejected {
                if self.is_stale(epoch) {
                    return;
                }
                self.reject(entry);
            }
            for entry in partition.ready {
                if self.is_stale(epoch) {
                    return;
                }
                self.fire(entry);
            }
        }
    }

    /// Whether a reset happened since `epoch`.
    fn is_stale(&self, epoch: u64) -> bool {
        let stale = self.inner.state.borrow().epoch != epoch;
        if stale {
            tracing::debug!("Reset during drain; abandoning the rest of the pass");
        }
        stale
    }

    fn fire(&self, entry: PendingEntry) {
        if let Some(name) = &entry.name {
            self.inner.state.borrow_mut().tracker.mark_ready(name);
        }

        match entry.action {
            Action::Callback(callback) => callback(),
            Action::Release {
                name,
                assets,
            } => self.inject_assets(&name, &assets),
            Action::Notify(sender) => {
                // the waiter may have been dropped
                let _ = sender.send(Ok(()));
            }
        }
    }

    fn reject(&self, rejected: Rejected) {
        let Rejected {
            entry,
            dependency,
            error,
        } = rejected;
        let label = entry.label().to_string();

        match entry.action {
            Action::Notify(sender) => {
                let _ = sender.send(Err(error));
            }
            Action::Release {
                name, ..
            } => {
                self.inner.state.borrow_mut().fail(
                    &name,
                    DependsError::DependencyFailed {
                        name: name.clone(),
                        dependency,
                    },
                );
            }
            Action::Callback(callback) => {
                let mut state = self.inner.state.borrow_mut();
                if let Some(name) = &entry.name {
                    state.fail(
                        name,
                        DependsError::DependencyFailed {
                            name: name.clone(),
                            dependency,
                        },
                    );
                }
                tracing::warn!("Dropping callback for '{}' after a dependency failed", label);
                state.record(Diagnostic::new(label, DiagnosticKind::CallbackDropped));
                drop(state);
                drop(callback);
            }
        }
    }
}
