//! Integration test suite for depends
//!
//! These tests drive the resolver only through its public API, with a
//! [`RecordingInjector`](depends::test_utils::RecordingInjector) standing in
//! for the page so each test controls when and how every injection completes.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **callbacks**: `load`/`load_once` with callbacks and gating on name sets
//! - **config**: configuration files feeding the registry
//! - **descriptors**: descriptor shapes and what they inject
//! - **failure**: failed loads, cycles and rejection of dependents
//! - **resolution**: ordering, idempotence, transitive closure and reset
//! - **waiters**: awaiting readiness with `ready`

mod callbacks;
mod config;
mod descriptors;
mod failure;
