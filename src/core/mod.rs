//! Core types for depends
//!
//! This module holds the error and diagnostic types shared by the registry,
//! the injector seam and the resolver.
//!
//! ## `error` - Error Handling
//!
//! - [`DependsError`] - Failure modes a waiter can observe
//! - [`Diagnostic`] - Non-fatal anomaly recorded while resolving a name
//! - [`DiagnosticKind`] - Category of a diagnostic

pub mod error;

pub use error::{DependsError, Diagnostic, DiagnosticKind};
