//! CLI configuration: environment defaults overridden by flags.

use std::path::PathBuf;

use switchboard::config::{parse_namespace, DEFAULT_NAMESPACE};
use switchboard::ManagerConfig;

use crate::Cli;

/// Default definitions file, relative to the working directory.
pub const DEFAULT_DEFINITIONS: &str = "switches.toml";

/// Resolved settings for one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Env: `SWITCHBOARD_DEFINITIONS`
    pub definitions: PathBuf,
    /// Autocreate and namespace, from `SWITCHBOARD_AUTOCREATE` and
    /// `SWITCHBOARD_NAMESPACE`.
    pub manager: ManagerConfig,
    pub verbose: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            definitions: std::env::var("SWITCHBOARD_DEFINITIONS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DEFINITIONS)),
            manager: ManagerConfig::from_env(),
            verbose: false,
        }
    }
}

impl CliConfig {
    /// Apply command-line overrides. Flags win over the environment.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(path) = &cli.definitions {
            self.definitions = path.clone();
        }
        if let Some(namespace) = &cli.namespace {
            let namespace = parse_namespace(namespace);
            self.manager.namespace = if namespace.is_empty() {
                vec![DEFAULT_NAMESPACE.to_string()]
            } else {
                namespace
            };
        }
        if cli.autocreate {
            self.manager.autocreate = true;
        }
        self.verbose |= cli.verbose;
        self
    }

    /// Whether evaluation happens in the default namespace.
    pub fn is_default_namespace(&self) -> bool {
        self.manager.namespace.len() == 1 && self.manager.namespace[0] == DEFAULT_NAMESPACE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn base() -> CliConfig {
        CliConfig {
            definitions: PathBuf::from(DEFAULT_DEFINITIONS),
            manager: ManagerConfig::default(),
            verbose: false,
        }
    }

    #[test]
    fn test_flags_override() {
        let cli = Cli::try_parse_from([
            "switchboard",
            "--definitions",
            "/etc/flags.toml",
            "--namespace",
            "shop.eu",
            "--autocreate",
            "-v",
            "list",
        ])
        .unwrap();
        let config = base().with_cli(&cli);
        assert_eq!(config.definitions, PathBuf::from("/etc/flags.toml"));
        assert_eq!(config.manager.namespace, vec!["shop", "eu"]);
        assert!(config.manager.autocreate);
        assert!(config.verbose);
        assert!(!config.is_default_namespace());
    }

    #[test]
    fn test_no_flags_keeps_base() {
        let cli = Cli::try_parse_from(["switchboard", "operators"]).unwrap();
        let config = base().with_cli(&cli);
        assert_eq!(config, base());
        assert!(config.is_default_namespace());
    }
}
