//! TOML switch definitions
//!
//! Declares document argument adapters and switches in a file and installs
//! them into a manager.
//!
//! ```toml
//! [[arguments]]
//! name = "User"
//! kind = "user"
//! variables = { age = { type = "integer" }, country = { type = "string", path = "address.country" } }
//!
//! [[switches]]
//! name = "beta"
//! state = "selective"
//!
//! [[switches.conditions]]
//! argument = "User"
//! attribute = "age"
//! operator = "more_than_or_equal_to"
//! params = { lower_limit = 21 }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arguments::{DocumentArguments, SharedArgument};
use crate::condition::Condition;
use crate::config::parse_namespace;
use crate::error::SwitchError;
use crate::manager::Manager;
use crate::operators::{self, OperatorError, Params};
use crate::switch::{Switch, SwitchState};
use crate::variable::VariableKind;

/// Errors raised while loading or installing definitions
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid definitions: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("switch '{switch}' references unknown argument '{argument}'")]
    UnknownArgument { switch: String, argument: String },

    #[error("switch '{switch}': {source}")]
    Operator {
        switch: String,
        #[source]
        source: OperatorError,
    },

    #[error(transparent)]
    Switch(#[from] SwitchError),
}

/// Result type for definition loading
pub type DefinitionResult<T> = Result<T, DefinitionError>;

/// A declared variable of a document argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    #[serde(rename = "type")]
    pub kind: VariableKind,
    /// Dotted path or JSON pointer; defaults to the variable name.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentDefinition {
    pub name: String,
    /// Document kind the adapter applies to.
    pub kind: String,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableDefinition>,
}

impl ArgumentDefinition {
    pub fn build(&self) -> DocumentArguments {
        self.variables.iter().fold(
            DocumentArguments::new(&self.name, &self.kind),
            |args, (name, var)| {
                let path = var.path.as_deref().unwrap_or(name);
                args.variable(name, var.kind, path)
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDefinition {
    pub argument: String,
    pub attribute: String,
    pub operator: String,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub negative: bool,
}

fn default_consent() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchDefinition {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: SwitchState,
    #[serde(default)]
    pub compounded: bool,
    #[serde(default = "default_consent")]
    pub consent: bool,
    /// Dotted namespace relative to the installing manager.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
}

/// Parsed contents of a definitions file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default)]
    pub arguments: Vec<ArgumentDefinition>,
    #[serde(default)]
    pub switches: Vec<SwitchDefinition>,
}

impl Definitions {
    pub fn from_toml_str(source: &str) -> DefinitionResult<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> DefinitionResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Argument adapters by name.
    pub fn arguments(&self) -> BTreeMap<String, SharedArgument> {
        self.arguments
            .iter()
            .map(|def| (def.name.clone(), Arc::new(def.build()) as SharedArgument))
            .collect()
    }

    /// Register every switch with `manager`, returning how many were
    /// installed.
    ///
    /// Switches are registered shallowest-first so that colon-named
    /// children find their parents already stored.
    pub fn install(&self, manager: &Manager) -> DefinitionResult<usize> {
        let arguments = self.arguments();

        let mut ordered: Vec<&SwitchDefinition> = self.switches.iter().collect();
        ordered.sort_by_key(|def| def.name.matches(':').count());

        for def in &ordered {
            let target = match &def.namespace {
                Some(path) => parse_namespace(path)
                    .into_iter()
                    .fold(manager.clone(), |m, segment| m.namespaced(segment)),
                None => manager.clone(),
            };

            let mut switch = def.build(&arguments)?;
            target.register(&mut switch)?;
            debug!(
                switch = def.name.as_str(),
                namespace = %target.namespace_path(),
                conditions = def.conditions.len(),
                "Installed switch definition"
            );
        }
        Ok(ordered.len())
    }
}

impl SwitchDefinition {
    /// Build the switch, resolving condition arguments from `arguments`.
    pub fn build(&self, arguments: &BTreeMap<String, SharedArgument>) -> DefinitionResult<Switch> {
        let conditions = self
            .conditions
            .iter()
            .map(|def| {
                let argument = arguments.get(&def.argument).cloned().ok_or_else(|| {
                    DefinitionError::UnknownArgument {
                        switch: self.name.clone(),
                        argument: def.argument.clone(),
                    }
                })?;
                let operator = operators::build(&def.operator, &def.params).map_err(|source| {
                    DefinitionError::Operator {
                        switch: self.name.clone(),
                        source,
                    }
                })?;
                let condition = Condition::with_operator(argument, &def.attribute, operator);
                Ok(if def.negative {
                    condition.negated()
                } else {
                    condition
                })
            })
            .collect::<DefinitionResult<Vec<_>>>()?;

        let mut switch = Switch::new(&self.name)
            .with_state(self.state)
            .with_compounded(self.compounded)
            .with_consent(self.consent)
            .with_conditions(conditions);
        switch.label = self.label.clone();
        switch.description = self.description.clone();
        switch.reset();
        Ok(switch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Document;
    use serde_json::json;

    const DEFINITIONS: &str = r#"
[[arguments]]
name = "User"
kind = "user"

[arguments.variables]
age = { type = "integer" }
country = { type = "string", path = "address.country" }

[[switches]]
name = "beta:checkout"
state = "global"

[[switches]]
name = "beta"
label = "Beta programme"
state = "selective"

[[switches.conditions]]
argument = "User"
attribute = "age"
operator = "more_than_or_equal_to"
params = { lower_limit = 21 }

[[switches]]
name = "booze"
namespace = "de"
state = "selective"

[[switches.conditions]]
argument = "User"
attribute = "country"
operator = "equals"
params = { value = "us" }
negative = true
"#;

    fn user(age: i64, country: &str) -> crate::Input {
        Document::new("user", json!({"age": age, "address": {"country": country}})).into_input()
    }

    #[test]
    fn test_parse() {
        let defs = Definitions::from_toml_str(DEFINITIONS).unwrap();
        assert_eq!(defs.arguments.len(), 1);
        assert_eq!(defs.switches.len(), 3);
        let beta = &defs.switches[1];
        assert_eq!(beta.state, SwitchState::Selective);
        assert!(beta.consent);
        assert_eq!(beta.label.as_deref(), Some("Beta programme"));
        assert_eq!(beta.conditions[0].params["lower_limit"], crate::Variable::Integer(21));
    }

    #[test]
    fn test_install_orders_parents_first() {
        let manager = Manager::default();
        let installed = Definitions::from_toml_str(DEFINITIONS)
            .unwrap()
            .install(&manager)
            .unwrap();
        assert_eq!(installed, 3);

        let child = manager.switch("beta:checkout").unwrap();
        assert_eq!(child.parent.as_deref(), Some("beta"));
        assert_eq!(manager.switch("beta").unwrap().children, vec!["beta:checkout"]);

        assert!(manager.active("beta:checkout", &[user(30, "de")]).unwrap());
        assert!(!manager.active("beta:checkout", &[user(16, "de")]).unwrap());
    }

    #[test]
    fn test_install_into_namespace() {
        let manager = Manager::default();
        Definitions::from_toml_str(DEFINITIONS)
            .unwrap()
            .install(&manager)
            .unwrap();

        assert!(manager.switch("booze").is_err());
        let de = manager.namespaced("de");
        assert!(de.active("booze", &[user(30, "de")]).unwrap());
        assert!(!de.active("booze", &[user(30, "us")]).unwrap());
    }

    #[test]
    fn test_unknown_argument() {
        let source = r#"
[[switches]]
name = "x"

[[switches.conditions]]
argument = "Account"
attribute = "id"
operator = "true"
"#;
        let err = Definitions::from_toml_str(source)
            .unwrap()
            .install(&Manager::default())
            .unwrap_err();
        assert!(matches!(err, DefinitionError::UnknownArgument { .. }));
    }

    #[test]
    fn test_operator_error_names_switch() {
        let source = r#"
[[arguments]]
name = "User"
kind = "user"

[[switches]]
name = "x"

[[switches.conditions]]
argument = "User"
attribute = "age"
operator = "between"
params = { lower_limit = 1 }
"#;
        let err = Definitions::from_toml_str(source)
            .unwrap()
            .install(&Manager::default())
            .unwrap_err();
        assert!(matches!(err, DefinitionError::Operator { .. }));
        assert!(err.to_string().starts_with("switch 'x':"));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEFINITIONS.as_bytes()).unwrap();
        let defs = Definitions::load(file.path()).unwrap();
        assert_eq!(defs, Definitions::from_toml_str(DEFINITIONS).unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Definitions::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, DefinitionError::Io { .. }));
    }
}
