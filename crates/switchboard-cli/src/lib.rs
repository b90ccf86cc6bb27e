//! Switchboard CLI
//!
//! Loads switch definitions from a TOML file and answers activation
//! queries from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Is "beta" active for this user?
//! switchboard --definitions switches.toml check beta --input 'user={"age": 25}'
//!
//! # Ambient inputs are combined with explicit ones unless --exclusive is set
//! switchboard check beta --context 'user={"age": 40}' --input 'user={"age": 12}' --exclusive
//!
//! # Inspect definitions
//! switchboard --namespace de list
//! switchboard explain beta
//! switchboard operators
//! ```
//!
//! `check` exits 0 when the switch is active, 1 when inactive and 2 on
//! any error.

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod telemetry;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use switchboard::storage::MemoryStorage;
use switchboard::{operators, Definitions, Document, Input, Manager, Switch};
use tracing::info;

pub use config::CliConfig;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "switchboard", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the switch definitions file (overrides SWITCHBOARD_DEFINITIONS)
    #[arg(long, global = true)]
    pub definitions: Option<PathBuf>,

    /// Dotted namespace to evaluate in (overrides SWITCHBOARD_NAMESPACE)
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Create unknown switches as disabled instead of failing
    #[arg(long, global = true, default_value_t = false)]
    pub autocreate: bool,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check whether a switch is active
    Check {
        /// Switch name
        name: String,

        /// Explicit input document, as KIND=JSON
        #[arg(long = "input", value_name = "KIND=JSON")]
        inputs: Vec<String>,

        /// Ambient input document, as KIND=JSON
        #[arg(long = "context", value_name = "KIND=JSON")]
        context: Vec<String>,

        /// Ignore ambient inputs
        #[arg(long, default_value_t = false)]
        exclusive: bool,
    },

    /// List switches registered in the namespace
    List,

    /// Show a switch's settings and conditions
    Explain {
        /// Switch name
        name: String,
    },

    /// List the standard operators
    Operators,
}

/// What a command concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Active,
    Inactive,
    Done,
}

impl Outcome {
    /// Process exit code: 0 for active or completed, 1 for inactive.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Active | Self::Done => 0,
            Self::Inactive => 1,
        }
    }
}

/// Exit code for failed invocations.
pub const ERROR_EXIT_CODE: u8 = 2;

/// Parse a `KIND=JSON` argument into a document input.
pub fn parse_input(raw: &str) -> Result<Input> {
    let (kind, body) = raw
        .split_once('=')
        .with_context(|| format!("input '{}' is not of the form KIND=JSON", raw))?;
    let kind = kind.trim();
    if kind.is_empty() {
        anyhow::bail!("input '{}' has an empty kind", raw);
    }
    let body: serde_json::Value = serde_json::from_str(body)
        .with_context(|| format!("input '{}' carries invalid JSON", raw))?;
    Ok(Document::new(kind, body).into_input())
}

/// Build a manager with the definitions installed and return the view for
/// the configured namespace.
pub fn load_manager(config: &CliConfig) -> Result<Manager> {
    let definitions = Definitions::load(&config.definitions).with_context(|| {
        format!(
            "failed to load definitions from {}",
            config.definitions.display()
        )
    })?;

    let root = Manager::builder()
        .storage(MemoryStorage::new().shared())
        .autocreate(config.manager.autocreate)
        .build();
    telemetry::bridge_signals(root.signals());

    let installed = definitions
        .install(&root)
        .context("failed to install definitions")?;
    info!(
        switches = installed,
        path = %config.definitions.display(),
        "Definitions installed"
    );

    if config.is_default_namespace() {
        return Ok(root);
    }
    Ok(config
        .manager
        .namespace
        .iter()
        .fold(root.clone(), |manager, segment| manager.namespaced(segment.clone())))
}

/// Execute `command`, writing its report to `out`.
pub fn run(config: &CliConfig, command: &Command, out: &mut impl Write) -> Result<Outcome> {
    match command {
        Command::Operators => {
            for info in operators::catalog() {
                writeln!(
                    out,
                    "{:<24} {:<11} {} ({})",
                    info.name,
                    info.group,
                    info.preposition,
                    info.arguments.join(", ")
                )?;
            }
            Ok(Outcome::Done)
        }
        Command::List => {
            let manager = load_manager(config)?;
            for switch in manager.switches()? {
                writeln!(out, "{}", switch)?;
            }
            Ok(Outcome::Done)
        }
        Command::Explain { name } => {
            let manager = load_manager(config)?;
            let switch = manager.switch(name)?;
            explain(&switch, out)?;
            Ok(Outcome::Done)
        }
        Command::Check {
            name,
            inputs,
            context,
            exclusive,
        } => {
            let explicit = inputs
                .iter()
                .map(|raw| parse_input(raw))
                .collect::<Result<Vec<_>>>()?;
            let ambient = context
                .iter()
                .map(|raw| parse_input(raw))
                .collect::<Result<Vec<_>>>()?;

            let manager = load_manager(config)?;
            manager.input(ambient);
            let active = if *exclusive {
                manager.active_exclusive(name, &explicit)
            } else {
                manager.active(name, &explicit)
            };
            manager.flush();

            let active = active.with_context(|| format!("failed to evaluate switch '{}'", name))?;
            writeln!(out, "{}", if active { "active" } else { "inactive" })?;
            Ok(if active {
                Outcome::Active
            } else {
                Outcome::Inactive
            })
        }
    }
}

fn explain(switch: &Switch, out: &mut impl Write) -> Result<()> {
    writeln!(out, "{}", switch)?;
    if let Some(description) = &switch.description {
        writeln!(out, "  description: {}", description)?;
    }
    writeln!(out, "  compounded: {}", switch.compounded)?;
    writeln!(out, "  consent: {}", switch.consent)?;
    writeln!(
        out,
        "  parent: {}",
        switch.parent.as_deref().unwrap_or("-")
    )?;
    if switch.children.is_empty() {
        writeln!(out, "  children: -")?;
    } else {
        writeln!(out, "  children: {}", switch.children.join(", "))?;
    }
    if switch.conditions.is_empty() {
        writeln!(out, "  conditions: -")?;
    } else {
        let mode = if switch.compounded { "all" } else { "any" };
        writeln!(out, "  conditions ({}):", mode)?;
        for condition in &switch.conditions {
            writeln!(out, "    {}", condition)?;
        }
    }
    Ok(())
}
