//! Argument adapters
//!
//! An argument adapter knows how to read one kind of runtime input. It
//! declares a table of named variables, each an extraction function plus the
//! [`VariableKind`] its raw result is coerced into, and reports whether a
//! given input is something it can read at all.
//!
//! ```rust,ignore
//! use switchboard::arguments::Arguments;
//!
//! struct User { age: u32, email: String }
//!
//! let user_args = Arguments::<User>::new("User")
//!     .integer("age", |u| u.age)
//!     .string("email", |u| u.email.clone())
//!     .shared();
//! ```

pub mod document;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::input::Input;
use crate::variable::{CoercionError, Variable, VariableKind};

pub use document::{Document, DocumentArguments};

/// Errors raised while extracting a variable from an input.
///
/// These indicate a misconfigured adapter or condition and are never
/// swallowed by condition evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgumentError {
    #[error("{argument} declares no variable named '{attribute}'")]
    UnknownVariable { argument: String, attribute: String },

    #[error("{argument} cannot read inputs of type {type_name}")]
    Incompatible {
        argument: String,
        type_name: &'static str,
    },

    #[error("{argument}.{attribute}: {source}")]
    Coercion {
        argument: String,
        attribute: String,
        #[source]
        source: CoercionError,
    },
}

/// Result type for variable extraction
pub type ArgumentResult<T> = Result<T, ArgumentError>;

/// Shared handle to an argument adapter.
pub type SharedArgument = Arc<dyn Argument>;

/// Reads named, coerced variables out of a compatible input.
pub trait Argument: Send + Sync {
    /// Adapter name, used in condition descriptions (`User.age`).
    fn name(&self) -> &str;

    /// Whether this adapter can read `input`.
    ///
    /// An adapter with no compatible input type never applies.
    fn applies(&self, input: &Input) -> bool {
        let _ = input;
        false
    }

    /// Extract and coerce the variable named `attribute`.
    fn variable(&self, input: &Input, attribute: &str) -> ArgumentResult<Variable>;

    /// Declared variables and their kinds, sorted by name.
    fn arguments(&self) -> Vec<(&str, VariableKind)>;

    /// Identifies the inputs this adapter reads.
    ///
    /// Two adapters sharing a name but reading different inputs differ here.
    fn input_kind(&self) -> String {
        std::any::type_name_of_val(self).to_string()
    }

    /// `Adapter.variable` form used when describing conditions.
    fn describe(&self, attribute: &str) -> String {
        format!("{}.{}", self.name(), attribute)
    }
}

impl fmt::Debug for dyn Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name())
            .field("arguments", &self.arguments())
            .finish()
    }
}

type Extractor<T> = Arc<dyn Fn(&T) -> Variable + Send + Sync>;

struct Declared<T> {
    kind: VariableKind,
    extract: Extractor<T>,
}

impl<T> Clone for Declared<T> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            extract: Arc::clone(&self.extract),
        }
    }
}

/// Adapter for inputs whose concrete type is exactly `T`.
pub struct Arguments<T> {
    name: String,
    variables: BTreeMap<String, Declared<T>>,
}

impl<T> Clone for Arguments<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            variables: self.variables.clone(),
        }
    }
}

impl<T: Any + Send + Sync> Arguments<T> {
    /// Create an adapter with no declared variables.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Declare a variable extracted by `extract` and coerced into `kind`.
    pub fn variable<V, F>(mut self, name: impl Into<String>, kind: VariableKind, extract: F) -> Self
    where
        V: Into<Variable>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.variables.insert(
            name.into(),
            Declared {
                kind,
                extract: Arc::new(move |input: &T| extract(input).into()),
            },
        );
        self
    }

    pub fn integer<V, F>(self, name: impl Into<String>, extract: F) -> Self
    where
        V: Into<Variable>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.variable(name, VariableKind::Integer, extract)
    }

    pub fn float<V, F>(self, name: impl Into<String>, extract: F) -> Self
    where
        V: Into<Variable>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.variable(name, VariableKind::Float, extract)
    }

    pub fn boolean<V, F>(self, name: impl Into<String>, extract: F) -> Self
    where
        V: Into<Variable>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.variable(name, VariableKind::Boolean, extract)
    }

    pub fn string<V, F>(self, name: impl Into<String>, extract: F) -> Self
    where
        V: Into<Variable>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.variable(name, VariableKind::String, extract)
    }

    pub fn value<V, F>(self, name: impl Into<String>, extract: F) -> Self
    where
        V: Into<Variable>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.variable(name, VariableKind::Value, extract)
    }

    /// Wrap into a shared handle for use in conditions.
    pub fn shared(self) -> SharedArgument {
        Arc::new(self)
    }
}

impl<T: Any + Send + Sync> Argument for Arguments<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies(&self, input: &Input) -> bool {
        input.downcast_ref::<T>().is_some()
    }

    fn variable(&self, input: &Input, attribute: &str) -> ArgumentResult<Variable> {
        let declared =
            self.variables
                .get(attribute)
                .ok_or_else(|| ArgumentError::UnknownVariable {
                    argument: self.name.clone(),
                    attribute: attribute.to_string(),
                })?;
        let value = input
            .downcast_ref::<T>()
            .ok_or_else(|| ArgumentError::Incompatible {
                argument: self.name.clone(),
                type_name: input.type_name(),
            })?;

        declared
            .kind
            .coerce((declared.extract)(value))
            .map_err(|source| ArgumentError::Coercion {
                argument: self.name.clone(),
                attribute: attribute.to_string(),
                source,
            })
    }

    fn arguments(&self) -> Vec<(&str, VariableKind)> {
        self.variables
            .iter()
            .map(|(name, declared)| (name.as_str(), declared.kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        age: u32,
        email: String,
        score: String,
        admin: bool,
    }

    fn user() -> User {
        User {
            age: 25,
            email: "ada@example.com".to_string(),
            score: "97".to_string(),
            admin: false,
        }
    }

    fn user_args() -> Arguments<User> {
        Arguments::<User>::new("User")
            .integer("age", |u| u.age)
            .string("email", |u| u.email.clone())
            .integer("score", |u| u.score.clone())
            .boolean("admin", |u| u.admin)
    }

    struct Unbound;

    impl Argument for Unbound {
        fn name(&self) -> &str {
            "Unbound"
        }
        fn variable(&self, _input: &Input, attribute: &str) -> ArgumentResult<Variable> {
            Err(ArgumentError::UnknownVariable {
                argument: "Unbound".to_string(),
                attribute: attribute.to_string(),
            })
        }
        fn arguments(&self) -> Vec<(&str, VariableKind)> {
            Vec::new()
        }
    }

    #[test]
    fn test_applies_only_to_exact_type() {
        let args = user_args();
        assert!(args.applies(&Input::new(user())));
        assert!(!args.applies(&Input::new("not a user".to_string())));
        assert!(!args.applies(&Input::NONE));
    }

    #[test]
    fn test_adapter_without_compatible_type_never_applies() {
        assert!(!Unbound.applies(&Input::new(user())));
        assert!(!Unbound.applies(&Input::new(())));
    }

    #[test]
    fn test_variable_extraction_and_coercion() {
        let args = user_args();
        let input = Input::new(user());
        assert_eq!(Argument::variable(&args, &input, "age").unwrap(), Variable::Integer(25));
        assert_eq!(
            Argument::variable(&args, &input, "email").unwrap(),
            Variable::from("ada@example.com")
        );
        // String field declared as integer is parsed.
        assert_eq!(Argument::variable(&args, &input, "score").unwrap(), Variable::Integer(97));
        assert_eq!(Argument::variable(&args, &input, "admin").unwrap(), Variable::Boolean(false));
    }

    #[test]
    fn test_unknown_variable_errors() {
        let err = Argument::variable(&user_args(), &Input::new(user()), "height")
            .unwrap_err();
        assert_eq!(
            err,
            ArgumentError::UnknownVariable {
                argument: "User".to_string(),
                attribute: "height".to_string()
            }
        );
    }

    #[test]
    fn test_coercion_failure_errors() {
        let args = Arguments::<User>::new("User").integer("email", |u| u.email.clone());
        let err = Argument::variable(&args, &Input::new(user()), "email").unwrap_err();
        assert!(matches!(err, ArgumentError::Coercion { .. }));
        assert!(err.to_string().starts_with("User.email:"));
    }

    #[test]
    fn test_arguments_table_lists_declared_variables() {
        let args = user_args();
        assert_eq!(
            args.arguments(),
            vec![
                ("admin", VariableKind::Boolean),
                ("age", VariableKind::Integer),
                ("email", VariableKind::String),
                ("score", VariableKind::Integer),
            ]
        );
        assert_eq!(args.describe("age"), "User.age");
    }
}
