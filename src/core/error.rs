//! Error handling for depends
//!
//! The resolver degrades gracefully: anomalies in the registry or in the
//! injector never abort a batch of requests. Instead they are logged through
//! `tracing`, recorded as [`Diagnostic`]s on the resolver, and (for callers
//! awaiting readiness through [`Depends::ready`](crate::resolver::Depends::ready))
//! surfaced as a [`DependsError`].
//!
//! # Error Categories
//!
//! - **Registry**: [`DependsError::CircularDependency`]
//! - **Loading**: [`DependsError::LoadFailed`], [`DependsError::DependencyFailed`]
//! - **Lifecycle**: [`DependsError::Cancelled`]
//!
//! # Examples
//!
//! ```rust
//! use depends::core::DependsError;
//!
//! let error = DependsError::LoadFailed {
//!     name: "charts".to_string(),
//!     resource: "charts.js".to_string(),
//!     reason: "404".to_string(),
//! };
//! assert_eq!(error.to_string(), "Failed to load 'charts.js' for 'charts': 404");
//! assert_eq!(error.name(), Some("charts"));
//! ```

use std::fmt;
use thiserror::Error;

/// The main error type for depends operations.
///
/// Each variant names the dependency it concerns so that callers awaiting a
/// set of names can tell which one broke the set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependsError {
    /// The registry declares dependencies that loop back on themselves.
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// Names along the cycle, joined with arrows
        chain: String,
    },

    /// The injector reported that one of a name's resources failed to load.
    #[error("Failed to load '{resource}' for '{name}': {reason}")]
    LoadFailed {
        /// Name that owns the resource
        name: String,
        /// Locator of the failed resource
        resource: String,
        /// Reason reported by the injector
        reason: String,
    },

    /// A name can never become ready because one of its dependencies failed.
    #[error("'{name}' cannot load because its dependency '{dependency}' failed")]
    DependencyFailed {
        /// Name that was waiting
        name: String,
        /// Dependency that failed
        dependency: String,
    },

    /// The wait was abandoned, typically because the resolver was reset.
    #[error("Waiting for dependencies was cancelled")]
    Cancelled,
}

impl DependsError {
    /// Name the error is attached to, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::LoadFailed { name, .. }
            | Self::DependencyFailed { name, .. } => Some(name),
            Self::CircularDependency { .. } | Self::Cancelled => None,
        }
    }
}

/// Category of a recorded [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A requested name has no registry entry and was treated as empty.
    UnknownName {
        /// Registered names close to the requested one
        suggestions: Vec<String>,
    },
    /// The name's descriptor was malformed and was treated as empty.
    MalformedDescriptor {
        /// Decoder message
        reason: String,
    },
    /// The name sits on a dependency cycle.
    CircularDependency {
        /// Names along the cycle
        chain: Vec<String>,
    },
    /// The name, or something it waits on, failed to load.
    Failed(DependsError),
    /// A plain callback gated on the name was discarded after a failure.
    CallbackDropped,
}

/// A non-fatal anomaly observed while resolving a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Name the diagnostic concerns
    pub name: String,
    /// What went wrong
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Create a diagnostic for `name`.
    pub fn new(name: impl Into<String>, kind: DiagnosticKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnknownName {
                suggestions,
            } => {
                write!(f, "'{}' is not registered; treating it as empty", self.name)?;
                if !suggestions.is_empty() {
                    write!(f, " (did you mean {}?)", suggestions.join(", "))?;
                }
                Ok(())
            }
            DiagnosticKind::MalformedDescriptor {
                reason,
            } => write!(f, "'{}' has an invalid descriptor ({reason}); treating it as empty", self.name),
            DiagnosticKind::CircularDependency {
                chain,
            } => write!(f, "'{}' is part of a dependency cycle: {}", self.name, chain.join(" → ")),
            DiagnosticKind::Failed(error) => write!(f, "{error}"),
            DiagnosticKind::CallbackDropped => {
                write!(f, "callback waiting on '{}' was dropped after a load failure", self.name)
            }
        }
    }
}
