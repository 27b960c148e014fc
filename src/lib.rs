//! depends - asynchronous dependency resolver for scripts and stylesheets
//!
//! A registry maps logical names (`"jquery"`, `"datatables"`) to the
//! stylesheets and scripts that make them up and to the names they depend on.
//! Requesting a name loads its dependencies first, hands each resource to a
//! pluggable injector, and runs deferred work once everything it needs has
//! loaded.
//!
//! # Architecture Overview
//!
//! - A **registry** of descriptors, merged over time and keyed by name
//! - An **injector** that begins loading one resource and later fires a
//!   single-use completion
//! - A **readiness tracker** with one forward-only state per name
//! - A **resolver** that expands names into their dependency closure, gating
//!   each name's resources on its dependencies being ready
//! - A **pending queue** of callbacks, internal gates and waiters, drained
//!   whenever a name changes state
//!
//! ## Key Features
//!
//! - **Idempotent**: every resource of a name is injected at most once per
//!   reset, however often or concurrently it is requested
//! - **Order-agnostic**: completions may arrive in any order
//! - **Lenient**: unknown and malformed names degrade to empty descriptors and
//!   are reported as [`Diagnostic`](core::Diagnostic)s
//! - **Failure-aware**: failed loads and dependency cycles reject dependents
//!   instead of leaving them waiting forever
//!
//! # Core Modules
//!
//! - [`registry`] - Descriptor parsing, normalization and storage
//! - [`injector`] - The loading seam and its completion handle
//! - [`resolver`] - Resolution, readiness tracking and the public verbs
//! - [`config`] - Resolver options and file-based registry definitions
//! - [`core`] - Errors and diagnostics
//!
//! # Descriptor Format
//!
//! ```toml
//! [registry]
//! jquery = "https://code.jquery.com/jquery-3.7.1.min.js"
//!
//! [registry.datatables]
//! style = ["datatables.css", { href = "print.css", media = "print" }]
//! script = "datatables.js"
//! dependencies = "jquery"
//! ```
//!
//! A bare string is a single script. Each field of a table accepts one value
//! or a list; a resource is a locator or a map of attributes with the locator
//! under `src` (scripts) or `href` (styles).
//!
//! # Example
//!
//! ```rust
//! use depends::injector::ImmediateInjector;
//! use depends::resolver::{Depends, Source};
//!
//! let depends = Depends::new(ImmediateInjector);
//! depends.register_json(&serde_json::json!({
//!     "jquery": "jquery.js",
//!     "datatables": { "script": "datatables.js", "dependencies": "jquery" }
//! }));
//!
//! depends.load("table", Source::callback(|| println!("ready")), ["datatables"]);
//! assert!(depends.are_ready(["jquery", "datatables", "table"]));
//! ```
//!
//! # Logging
//!
//! Everything is reported through `tracing`; install any subscriber to see
//! it. Anomalies log at `warn`, injections at `debug` and queue activity at
//! `trace`.

pub mod config;
pub mod constants;
pub mod core;
pub mod injector;
pub mod registry;
pub mod resolver;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
