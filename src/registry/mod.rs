//! Name to descriptor registry.
//!
//! Registration is additive: each call merges its entries over what is
//! already registered, replacing any existing name wholesale. Descriptors are
//! not validated against the resolver's state at registration time, and
//! registering never touches readiness of names that were already requested.
//!
//! Untyped input (JSON values, configuration tables) is decoded per name when
//! registered. A name whose value cannot be decoded is kept as a malformed
//! entry so the problem is reported when the name is requested, without
//! affecting its siblings.
//!
//! # Examples
//!
//! ```rust
//! use depends::registry::{Lookup, Registry};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry.register([("jquery", "jquery.js")]);
//! registry.register_json(&json!({
//!     "charts": { "script": "charts.js", "dependencies": ["jquery"] },
//!     "broken": 42
//! }));
//!
//! assert!(matches!(registry.lookup("charts"), Lookup::Found(_)));
//! assert!(matches!(registry.lookup("broken"), Lookup::Malformed(_)));
//! assert!(matches!(registry.lookup("nope"), Lookup::Unknown));
//! ```

pub mod descriptor;

pub use descriptor::{Assets, AttributeValue, Descriptor, ResourceKind, ResourceRef, StructuredDescriptor};

use std::collections::HashMap;
use strsim::levenshtein;

use crate::constants::{MAX_SUGGESTIONS, SUGGESTION_THRESHOLD_PERCENT};

#[derive(Debug, Clone)]
enum Entry {
    Valid(Descriptor),
    Malformed(String),
}

/// Result of looking a name up in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The name has a decoded descriptor.
    Found(&'a Descriptor),
    /// The name was registered with a value that could not be decoded.
    Malformed(&'a str),
    /// Nothing is registered under the name.
    Unknown,
}

/// Mapping from dependency names to descriptors.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: HashMap<String, Entry>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge typed descriptors into the registry, replacing existing names.
    pub fn register<K, D>(&mut self, descriptors: impl IntoIterator<Item = (K, D)>)
    where
        K: Into<String>,
        D: Into<Descriptor>,
    {
        for (name, descriptor) in descriptors {
            let name = name.into();
            tracing::trace!("Registering descriptor for '{}'", name);
            self.entries.insert(name, Entry::Valid(descriptor.into()));
        }
    }

    /// Merge an untyped object of descriptors into the registry.
    ///
    /// Each property is decoded on its own; values that do not decode are
    /// stored as malformed entries. A value that is not an object registers
    /// nothing. Returns the number of names written.
    pub fn register_json(&mut self, value: &serde_json::Value) -> usize {
        let Some(object) = value.as_object() else {
            tracing::warn!("Ignoring registration: expected an object of descriptors, got {}", value);
            return 0;
        };

        for (name, raw) in object {
            self.register_value(name.clone(), raw.clone());
        }
        object.len()
    }

    /// Decode and store one untyped descriptor.
    pub(crate) fn register_value(&mut self, name: String, raw: serde_json::Value) {
        let entry = match serde_json::from_value::<Descriptor>(raw) {
            Ok(descriptor) => Entry::Valid(descriptor),
            Err(e) => {
                tracing::debug!("Descriptor for '{}' did not decode: {}", name, e);
                Entry::Malformed(e.to_string())
            }
        };
        self.entries.insert(name, entry);
    }

    /// Look a name up.
    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        match self.entries.get(name) {
            Some(Entry::Valid(descriptor)) => Lookup::Found(descriptor),
            Some(Entry::Malformed(reason)) => Lookup::Malformed(reason),
            None => Lookup::Unknown,
        }
    }

    /// Descriptor registered under `name`, if it decoded.
    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        match self.lookup(name) {
            Lookup::Found(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Declared dependencies of `name`; empty for unknown or malformed names.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        match self.get(name) {
            Some(descriptor) => descriptor.dependencies(),
            None => &[],
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Registered names close to `name`, closest first.
    pub fn suggestions(&self, name: &str) -> Vec<String> {
        let threshold = name.len() * SUGGESTION_THRESHOLD_PERCENT / 100;
        let mut scored: Vec<(usize, &str)> = self
            .entries
            .keys()
            .map(|candidate| (levenshtein(name, candidate), candidate.as_str()))
            .filter(|(distance, _)| *distance <= threshold)
            .collect();

        scored.sort_unstable();
        scored.into_iter().take(MAX_SUGGESTIONS).map(|(_, candidate)| candidate.to_string()).collect()
    }
}
