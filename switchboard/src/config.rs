//! Manager configuration
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `SWITCHBOARD_AUTOCREATE` | `false` | Create a disabled switch on first lookup of an unknown name |
//! | `SWITCHBOARD_NAMESPACE` | `default` | Dotted namespace path, e.g. `shop.eu` |

use serde::{Deserialize, Serialize};

/// Name of the sentinel namespace a fresh manager starts in.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Separator joining namespace segments and the switch name into a key.
pub const NAMESPACE_SEPARATOR: &str = ".";

/// Settings a [`Manager`](crate::Manager) is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Fabricate a disabled switch instead of failing on unknown names.
    ///
    /// Env: `SWITCHBOARD_AUTOCREATE`
    pub autocreate: bool,

    /// Namespace path segments.
    ///
    /// Env: `SWITCHBOARD_NAMESPACE`
    pub namespace: Vec<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            autocreate: false,
            namespace: vec![DEFAULT_NAMESPACE.to_string()],
        }
    }
}

impl ManagerConfig {
    /// Read configuration from environment variables.
    ///
    /// Unset or empty variables leave the default in place.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(value) = lookup("SWITCHBOARD_AUTOCREATE") {
            config.autocreate = parse_bool_env_value(&value);
        }
        if let Some(value) = lookup("SWITCHBOARD_NAMESPACE") {
            let namespace = parse_namespace(&value);
            if !namespace.is_empty() {
                config.namespace = namespace;
            }
        }
        config
    }
}

/// Split a dotted namespace path, dropping empty segments.
pub fn parse_namespace(path: &str) -> Vec<String> {
    path.split(NAMESPACE_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a boolean from a raw string value.
/// Accepts "1", "true", or "yes" (case-insensitive).
pub fn parse_bool_env_value(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "1" || v == "true" || v == "yes"
}
