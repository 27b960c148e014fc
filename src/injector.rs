//! The seam between the resolver and whatever actually loads resources.
//!
//! An [`Injector`] receives one [`Resource`] at a time together with a
//! [`Completion`]. It starts loading the resource however it likes (appending
//! a `<script>` element, fetching into a cache, spawning a task) and later
//! fires the completion exactly once. Completions are consumed when fired, so
//! a second firing cannot be expressed.
//!
//! A completion that is dropped without firing leaves its owner loading
//! forever; the resolver imposes no timeout.
//!
//! # Examples
//!
//! ```rust
//! use depends::injector::{Completion, Resource};
//! use depends::resolver::{Depends, Readiness};
//!
//! let depends = Depends::new(|resource: &Resource, done: Completion| {
//!     println!("loading {}", resource.label());
//!     done.complete();
//! });
//! depends.register([("jquery", "jquery.js")]);
//! depends.ensure("jquery");
//! assert_eq!(depends.state("jquery"), Readiness::Ready);
//! ```

use std::fmt;
use std::rc::{Rc, Weak};

use crate::registry::{ResourceKind, ResourceRef};
use crate::resolver::tracker::ResourceId;

/// One resource handed to an [`Injector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Name the resource is loaded for
    pub owner: String,
    /// Script or style
    pub kind: ResourceKind,
    /// Reference exactly as registered
    pub reference: ResourceRef,
}

impl Resource {
    /// Create a resource owned by `owner`.
    pub fn new(owner: impl Into<String>, kind: ResourceKind, reference: ResourceRef) -> Self {
        Self {
            owner: owner.into(),
            kind,
            reference,
        }
    }

    /// Locator under the key matching this resource's kind.
    pub fn locator(&self) -> Option<&str> {
        self.reference.locator(self.kind)
    }

    /// Human-readable label for logs.
    pub fn label(&self) -> String {
        self.reference.label(self.kind)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' for '{}'", self.kind, self.label(), self.owner)
    }
}

/// Capability that begins loading resources.
pub trait Injector {
    /// Begin loading `resource` and fire `completion` once it has loaded.
    ///
    /// Implementations may fire the completion before returning.
    fn inject(&self, resource: &Resource, completion: Completion);
}

impl<F> Injector for F
where
    F: Fn(&Resource, Completion),
{
    fn inject(&self, resource: &Resource, completion: Completion) {
        self(resource, completion);
    }
}

/// Injector that reports every resource as loaded immediately.
///
/// Useful when resources are bundled or preloaded, and for exercising the
/// resolver's handling of completions that fire during injection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateInjector;

impl Injector for ImmediateInjector {
    fn inject(&self, resource: &Resource, completion: Completion) {
        tracing::trace!("Completing {} immediately", resource);
        completion.complete();
    }
}

/// What a completion reports back to its resolver.
pub(crate) struct Settlement {
    pub owner: String,
    pub label: String,
    pub id: ResourceId,
    pub epoch: u64,
    pub outcome: Result<(), String>,
}

/// Receiver of settlements, implemented by the resolver.
pub(crate) trait Settle {
    fn settle(self: Rc<Self>, settlement: Settlement);
}

struct Signal {
    sink: Weak<dyn Settle>,
    id: ResourceId,
    epoch: u64,
}

/// Single-fire completion signal for one injection.
///
/// Firing consumes the handle. If the resolver has been dropped, or reset
/// since the injection started, firing is a no-op.
pub struct Completion {
    owner: String,
    label: String,
    signal: Option<Signal>,
}

impl Completion {
    pub(crate) fn new(
        sink: Weak<dyn Settle>,
        resource: &Resource,
        id: ResourceId,
        epoch: u64,
    ) -> Self {
        Self {
            owner: resource.owner.clone(),
            label: resource.label(),
            signal: Some(Signal {
                sink,
                id,
                epoch,
            }),
        }
    }

    /// Name the injection belongs to.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Label of the injected resource.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Report that the resource loaded.
    pub fn complete(mut self) {
        self.fire(Ok(()));
    }

    /// Report that the resource failed to load.
    ///
    /// The owner moves to failed and everything waiting on it is rejected.
    pub fn fail(mut self, reason: impl Into<String>) {
        self.fire(Err(reason.into()));
    }

    fn fire(&mut self, outcome: Result<(), String>) {
        let Some(signal) = self.signal.take() else {
            return;
        };
        let Some(sink) = signal.sink.upgrade() else {
            tracing::trace!("Resolver for '{}' is gone; ignoring completion of '{}'", self.owner, self.label);
            return;
        };
        sink.settle(Settlement {
            owner: std::mem::take(&mut self.owner),
            label: std::mem::take(&mut self.label),
            id: signal.id,
            epoch: signal.epoch,
            outcome,
        });
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("owner", &self.owner)
            .field("label", &self.label)
            .field("fired", &self.signal.is_none())
            .finish()
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.signal.is_some() {
            tracing::debug!(
                "Completion of '{}' dropped without firing; '{}' stays loading",
                self.label,
                self.owner
            );
        }
    }
}
