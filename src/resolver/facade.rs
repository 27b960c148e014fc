//! User-facing verbs of the resolver.
//!
//! Nothing here returns an error: registry misuse and load failures degrade
//! to diagnostics. Callers that need to observe failures await
//! [`Depends::ready`].
//!
//! # Examples
//!
//! ```rust
//! use depends::injector::ImmediateInjector;
//! use depends::registry::StructuredDescriptor;
//! use depends::resolver::{Depends, NO_DEPENDENCIES, Source};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let depends = Depends::new(ImmediateInjector);
//! depends.register([
//!     ("jquery", StructuredDescriptor::new().script("jquery.js")),
//!     ("charts", StructuredDescriptor::new().script("charts.js").depends_on("jquery")),
//! ]);
//!
//! let ran = Rc::new(Cell::new(false));
//! let flag = ran.clone();
//! depends.load_once("dashboard", Source::callback(move || flag.set(true)), ["charts"]);
//! depends.load("analytics", "analytics.js", NO_DEPENDENCIES);
//!
//! assert!(ran.get());
//! assert!(depends.are_ready(["jquery", "charts", "dashboard", "analytics"]));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use super::graph::DependencyGraph;
use super::pending::{Action, PendingEntry};
use super::{Depends, Readiness};
use crate::config::DependsConfig;
use crate::core::{DependsError, Diagnostic};
use crate::injector::{Injector, Resource};
use crate::registry::{Descriptor, ResourceKind, ResourceRef};

/// Empty dependency list for [`Depends::load`] and [`Depends::load_once`].
pub const NO_DEPENDENCIES: [&str; 0] = [];

/// One name or a sequence of names.
pub trait IntoNames {
    /// Collect the names in order.
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoNames for &String {
    fn into_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl IntoNames for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self
    }
}

impl IntoNames for Vec<&str> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl IntoNames for &[&str] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| (*name).to_string()).collect()
    }
}

impl IntoNames for &[String] {
    fn into_names(self) -> Vec<String> {
        self.to_vec()
    }
}

impl<const N: usize> IntoNames for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| (*name).to_string()).collect()
    }
}

impl<const N: usize> IntoNames for &[&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|name| (*name).to_string()).collect()
    }
}

/// What [`Depends::load`] loads.
pub enum Source {
    /// A script injected right after the dependency requests are issued.
    Resource(ResourceRef),
    /// Work run once every dependency is ready.
    Callback(Box<dyn FnOnce()>),
}

impl Source {
    /// Wrap a closure.
    pub fn callback(callback: impl FnOnce() + 'static) -> Self {
        Self::Callback(Box::new(callback))
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(reference) => f.debug_tuple("Resource").field(reference).finish(),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}

impl From<&str> for Source {
    fn from(locator: &str) -> Self {
        Self::Resource(ResourceRef::from(locator))
    }
}

impl From<String> for Source {
    fn from(locator: String) -> Self {
        Self::Resource(ResourceRef::from(locator))
    }
}

impl From<ResourceRef> for Source {
    fn from(reference: ResourceRef) -> Self {
        Self::Resource(reference)
    }
}

/// Future returned by [`Depends::ready`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct WhenReady {
    receiver: oneshot::Receiver<Result<(), DependsError>>,
}

impl Future for WhenReady {
    type Output = Result<(), DependsError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DependsError::Cancelled)))
    }
}

impl Depends {
    /// Create a resolver from a configuration, registering its descriptors.
    pub fn with_config(injector: impl Injector + 'static, config: &DependsConfig) -> Self {
        let depends = Self::with_options(injector, config.resolver);
        config.apply_to(&mut depends.inner.state.borrow_mut().registry);
        depends
    }

    /// Merge descriptors into the registry, replacing existing names.
    ///
    /// Readiness of names already requested is not affected.
    pub fn register<K, D>(&self, descriptors: impl IntoIterator<Item = (K, D)>)
    where
        K: Into<String>,
        D: Into<Descriptor>,
    {
        self.inner.state.borrow_mut().registry.register(descriptors);
    }

    /// Merge an untyped object of descriptors into the registry.
    ///
    /// Returns the number of names written.
    pub fn register_json(&self, value: &serde_json::Value) -> usize {
        self.inner.state.borrow_mut().registry.register_json(value)
    }

    /// Load `source` after `dependencies`.
    ///
    /// A callback runs once every dependency is ready and marks `name` ready
    /// when it does. A resource is injected immediately after the dependency
    /// requests are issued, without waiting for them to complete, and `name`
    /// becomes ready when it loads. Every call loads again; see
    /// [`load_once`](Self::load_once).
    pub fn load(&self, name: impl Into<String>, source: impl Into<Source>, dependencies: impl IntoNames) {
        self.load_with(name.into(), source.into(), dependencies.into_names(), false);
    }

    /// Like [`load`](Self::load), but a no-op if `name` was seen before.
    pub fn load_once(&self, name: impl Into<String>, source: impl Into<Source>, dependencies: impl IntoNames) {
        self.load_with(name.into(), source.into(), dependencies.into_names(), true);
    }

    fn load_with(&self, name: String, source: Source, dependencies: Vec<String>, once: bool) {
        {
            let mut state = self.inner.state.borrow_mut();
            if once && state.tracker.is_tracked(&name) {
                tracing::debug!("'{}' already loaded once; skipping", name);
                return;
            }
            // tracked before the dependency requests so re-entrant calls see it
            state.tracker.begin(&name, matches!(source, Source::Callback(_)));
        }

        self.ensure(dependencies.clone());

        match source {
            Source::Callback(callback) => {
                self.enqueue(PendingEntry::new(Some(name), dependencies, Action::Callback(callback)));
            }
            Source::Resource(reference) => {
                let resource = Resource::new(name.as_str(), ResourceKind::Script, reference);
                let (id, epoch) = {
                    let mut state = self.inner.state.borrow_mut();
                    (state.tracker.track_resource(&name), state.epoch)
                };
                self.inject(&resource, id, epoch);
            }
        }
    }

    /// Request `names` and resolve once all of them are ready.
    ///
    /// The request is issued when this is called, not when the future is
    /// first polled. Resolves to the failure of the first name that can no
    /// longer become ready, or [`DependsError::Cancelled`] if the resolver is
    /// reset first.
    pub fn ready(&self, names: impl IntoNames) -> WhenReady {
        let names = names.into_names();
        let (sender, receiver) = oneshot::channel();

        self.ensure(names.clone());
        self.enqueue(PendingEntry::new(None, names, Action::Notify(sender)));

        WhenReady {
            receiver,
        }
    }

    /// Clear the registry, every readiness state, the pending queue and the
    /// diagnostics.
    ///
    /// Pending callbacks are dropped without running and waiters resolve to
    /// [`DependsError::Cancelled`]. Completions of injections started before
    /// the reset are ignored.
    pub fn reset(&self) {
        let abandoned = {
            let mut state = self.inner.state.borrow_mut();
            state.registry.clear();
            state.tracker.clear();
            state.diagnostics.clear();
            state.epoch += 1;
            state.pending.take_all()
        };
        tracing::debug!("Reset; abandoned {} pending entries", abandoned.len());
        drop(abandoned);
    }

    /// Readiness of `name`.
    pub fn state(&self, name: &str) -> Readiness {
        self.inner.state.borrow().tracker.state(name)
    }

    /// Whether `name` is ready.
    pub fn is_ready(&self, name: &str) -> bool {
        self.inner.state.borrow().tracker.is_ready(name)
    }

    /// Whether every name is ready.
    pub fn are_ready(&self, names: impl IntoNames) -> bool {
        let names = names.into_names();
        self.inner.state.borrow().tracker.are_ready(names.as_slice())
    }

    /// Number of entries waiting in the pending queue.
    pub fn pending_len(&self) -> usize {
        self.inner.state.borrow().pending.len()
    }

    /// Diagnostics recorded since creation or the last reset, oldest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.state.borrow().diagnostics.clone()
    }

    /// Registered names, sorted.
    pub fn registered(&self) -> Vec<String> {
        self.inner.state.borrow().registry.names().into_iter().map(str::to_string).collect()
    }

    /// Text tree of `name`'s declared dependencies.
    pub fn dependency_tree(&self, name: &str) -> String {
        let state = self.inner.state.borrow();
        DependencyGraph::from_registry(&state.registry, &[name]).to_tree_string(name)
    }

    /// Closure of `names` with every dependency before its dependents.
    ///
    /// # Errors
    ///
    /// Returns [`DependsError::CircularDependency`] if the closure has a cycle.
    pub fn load_order(&self, names: impl IntoNames) -> Result<Vec<String>, DependsError> {
        let names = names.into_names();
        let state = self.inner.state.borrow();
        DependencyGraph::from_registry(&state.registry, names.as_slice()).load_order(names.as_slice())
    }
}
