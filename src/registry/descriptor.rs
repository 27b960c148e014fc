//! Descriptor shapes accepted by the registry.
//!
//! A descriptor tells the resolver how to load one named dependency. Two
//! shapes are accepted and decoded once, when they are registered:
//!
//! ```toml
//! # Shorthand: a single script locator
//! jquery = "https://code.jquery.com/jquery-3.7.1.min.js"
//!
//! # Structured: any number of styles, scripts and dependency names
//! [datatables]
//! style = "datatables.css"
//! script = ["datatables.js", { src = "datatables.buttons.js", crossorigin = "anonymous" }]
//! dependencies = ["jquery"]
//! ```
//!
//! Every `style`, `script` and `dependencies` field takes either one value or
//! a list. A resource reference is either a bare locator or a table of
//! attributes passed through to the injector verbatim.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{SCRIPT_LOCATOR_KEY, STYLE_LOCATOR_KEY};

/// Kind of a loadable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A stylesheet
    Style,
    /// A script
    Script,
}

impl ResourceKind {
    /// Attribute under which this kind's locator is stored.
    pub const fn locator_key(self) -> &'static str {
        match self {
            Self::Style => STYLE_LOCATOR_KEY,
            Self::Script => SCRIPT_LOCATOR_KEY,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Style => write!(f, "style"),
            Self::Script => write!(f, "script"),
        }
    }
}

/// Scalar value of one resource attribute.
///
/// Booleans and numbers are kept as such so an injector can tell
/// `async = true` from `async = "true"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string value
    Text(String),
    /// A boolean flag such as `async` or `defer`
    Flag(bool),
    /// A numeric value
    Number(serde_json::Number),
}

impl AttributeValue {
    /// The value if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<bool> for AttributeValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<i64> for AttributeValue {
    fn from(number: i64) -> Self {
        Self::Number(number.into())
    }
}

/// Reference to one loadable resource.
///
/// The resolver never looks inside a reference beyond reading its locator for
/// log messages; injectors receive it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceRef {
    /// A bare locator such as `"js/app.js"`.
    Locator(String),
    /// Arbitrary attributes, e.g. `{ src = "app.js", integrity = "sha384-...", async = true }`.
    Attributes(BTreeMap<String, AttributeValue>),
}

impl ResourceRef {
    /// Build an attribute reference from key/value pairs.
    pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<AttributeValue>,
    {
        Self::Attributes(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Locator of this resource when loaded as `kind`.
    ///
    /// Attribute references look the locator up under `src` for scripts and
    /// `href` for styles. A non-text value there is not a locator.
    pub fn locator(&self, kind: ResourceKind) -> Option<&str> {
        match self {
            Self::Locator(locator) => Some(locator),
            Self::Attributes(attributes) => attributes.get(kind.locator_key()).and_then(AttributeValue::as_str),
        }
    }

    /// Human-readable label for logs and diagnostics.
    pub fn label(&self, kind: ResourceKind) -> String {
        self.locator(kind).map_or_else(|| format!("<{kind} without {}>", kind.locator_key()), str::to_string)
    }
}

impl From<&str> for ResourceRef {
    fn from(locator: &str) -> Self {
        Self::Locator(locator.to_string())
    }
}

impl From<String> for ResourceRef {
    fn from(locator: String) -> Self {
        Self::Locator(locator)
    }
}

impl From<BTreeMap<String, AttributeValue>> for ResourceRef {
    fn from(attributes: BTreeMap<String, AttributeValue>) -> Self {
        Self::Attributes(attributes)
    }
}

/// Either a single value or a list of values.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    OneOrMany::deserialize(deserializer).map(Vec::from)
}

/// Structured descriptor with explicit resource and dependency lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDescriptor {
    /// Stylesheets, injected before scripts.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub style: Vec<ResourceRef>,

    /// Scripts, injected in declared order.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub script: Vec<ResourceRef>,

    /// Names that must be ready before this descriptor's resources are injected.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl StructuredDescriptor {
    /// Create an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stylesheet.
    pub fn style(mut self, resource: impl Into<ResourceRef>) -> Self {
        self.style.push(resource.into());
        self
    }

    /// Add a script.
    pub fn script(mut self, resource: impl Into<ResourceRef>) -> Self {
        self.script.push(resource.into());
        self
    }

    /// Add a dependency name.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }
}

/// Registry value describing how to load one named dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Descriptor {
    /// Shorthand for a single script.
    Locator(String),
    /// Explicit styles, scripts and dependencies.
    Structured(StructuredDescriptor),
}

/// Wire shape of a descriptor. Structured descriptors must be tables; a
/// derived struct decoder would also accept sequences.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDescriptor {
    Locator(String),
    Table(serde_json::Map<String, serde_json::Value>),
}

impl<'de> Deserialize<'de> for Descriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawDescriptor::deserialize(deserializer)? {
            RawDescriptor::Locator(locator) => Ok(Self::Locator(locator)),
            RawDescriptor::Table(table) => serde_json::from_value(serde_json::Value::Object(table))
                .map(Self::Structured)
                .map_err(serde::de::Error::custom),
        }
    }
}

impl Descriptor {
    /// Normalize into ordered resource and dependency lists.
    pub fn assets(&self) -> Assets {
        match self {
            Self::Locator(locator) => Assets {
                styles: Vec::new(),
                scripts: vec![ResourceRef::Locator(locator.clone())],
                dependencies: Vec::new(),
            },
            Self::Structured(structured) => {
                let mut dependencies: Vec<String> = Vec::with_capacity(structured.dependencies.len());
                for name in &structured.dependencies {
                    if !dependencies.contains(name) {
                        dependencies.push(name.clone());
                    }
                }
                Assets {
                    styles: structured.style.clone(),
                    scripts: structured.script.clone(),
                    dependencies,
                }
            }
        }
    }

    /// Declared dependency names, in order.
    pub fn dependencies(&self) -> &[String] {
        match self {
            Self::Locator(_) => &[],
            Self::Structured(structured) => &structured.dependencies,
        }
    }
}

impl From<&str> for Descriptor {
    fn from(locator: &str) -> Self {
        Self::Locator(locator.to_string())
    }
}

impl From<String> for Descriptor {
    fn from(locator: String) -> Self {
        Self::Locator(locator)
    }
}

impl From<StructuredDescriptor> for Descriptor {
    fn from(structured: StructuredDescriptor) -> Self {
        Self::Structured(structured)
    }
}

/// A descriptor flattened into what the resolver acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assets {
    /// Stylesheets in declared order
    pub styles: Vec<ResourceRef>,
    /// Scripts in declared order
    pub scripts: Vec<ResourceRef>,
    /// Dependency names in declared order, duplicates removed
    pub dependencies: Vec<String>,
}

impl Assets {
    /// Resources tagged with their kind, styles first.
    pub fn resources(&self) -> impl Iterator<Item = (ResourceKind, &ResourceRef)> {
        self.styles
            .iter()
            .map(|r| (ResourceKind::Style, r))
            .chain(self.scripts.iter().map(|r| (ResourceKind::Script, r)))
    }
}
