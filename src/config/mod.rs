//! Configuration for depends.
//!
//! A configuration file carries resolver options and, optionally, the
//! registry itself so that asset definitions can live next to the application
//! instead of in code.
//!
//! # File Format
//!
//! TOML is the default format; a `.json` extension selects JSON with the same
//! structure.
//!
//! ```toml
//! [resolver]
//! warn-unknown = true
//! detect-cycles = true
//!
//! [registry]
//! jquery = "https://code.jquery.com/jquery-3.7.1.min.js"
//!
//! [registry.datatables]
//! style = "datatables.css"
//! script = "datatables.js"
//! dependencies = ["jquery"]
//! ```
//!
//! # Location
//!
//! [`DependsConfig::load`] reads the file named by the `DEPENDS_CONFIG_PATH`
//! environment variable, falling back to `depends.toml` in the working
//! directory. A missing default file yields the default configuration; a
//! missing file named by the environment variable is an error.
//!
//! Registry values are decoded per name when the configuration is applied, so
//! a single malformed descriptor does not reject the whole file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};
use crate::registry::Registry;

/// Options controlling how the resolver reports and guards against anomalies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverOptions {
    /// Report unknown names at `warn` level instead of `debug`.
    pub warn_unknown: bool,

    /// Fail names on a dependency cycle instead of leaving them loading.
    pub detect_cycles: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            warn_unknown: true,
            detect_cycles: true,
        }
    }
}

/// Complete configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependsConfig {
    /// Resolver options
    #[serde(default)]
    pub resolver: ResolverOptions,

    /// Descriptors to register, kept undecoded until applied.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub registry: BTreeMap<String, serde_json::Value>,
}

impl DependsConfig {
    /// Load from the configured location.
    ///
    /// # Errors
    ///
    /// Returns an error if the file named by `DEPENDS_CONFIG_PATH` is missing,
    /// or if the file found cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Path::new(&path)),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    tracing::debug!("No {} found; using default configuration", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load from a specific file, choosing the format by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        };
        config.with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Parse TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML for this structure.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid JSON for this structure.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Register this configuration's descriptors.
    pub fn apply_to(&self, registry: &mut Registry) {
        for (name, raw) in &self.registry {
            registry.register_value(name.clone(), raw.clone());
        }
        tracing::debug!("Registered {} descriptor(s) from configuration", self.registry.len());
    }
}
