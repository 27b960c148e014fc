//! Constants used throughout the depends codebase.

/// Attribute that carries a script's locator.
pub const SCRIPT_LOCATOR_KEY: &str = "src";

/// Attribute that carries a stylesheet's locator.
pub const STYLE_LOCATOR_KEY: &str = "href";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "DEPENDS_CONFIG_PATH";

/// Configuration file looked up in the working directory when no override is set.
pub const DEFAULT_CONFIG_FILE: &str = "depends.toml";

/// Maximum Levenshtein distance, as a percentage of the name's length, for
/// an unknown name to be offered a registered one as a suggestion.
pub const SUGGESTION_THRESHOLD_PERCENT: usize = 50;

/// Maximum number of suggestions listed for an unknown name.
pub const MAX_SUGGESTIONS: usize = 3;
