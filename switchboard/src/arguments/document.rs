//! Schemaless JSON document inputs.
//!
//! A [`Document`] is a JSON body tagged with a kind (`"user"`, `"request"`).
//! [`DocumentArguments`] applies to documents of one kind and reads its
//! variables by path, which makes adapters declarable from configuration
//! files instead of code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Argument, ArgumentError, ArgumentResult};
use crate::input::Input;
use crate::variable::{Variable, VariableKind};

/// A kind-tagged JSON input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub kind: String,
    pub body: serde_json::Value,
}

impl Document {
    pub fn new(kind: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            body,
        }
    }

    /// Wrap as an evaluation input.
    pub fn into_input(self) -> Input {
        Input::new(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    kind: VariableKind,
    pointer: String,
}

/// Adapter reading variables out of [`Document`]s of a single kind.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentArguments {
    name: String,
    kind: String,
    fields: BTreeMap<String, Field>,
}

impl DocumentArguments {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Declare a variable read from `path`.
    ///
    /// `path` is either a JSON pointer (`/profile/age`) or a dotted field
    /// path (`profile.age`). Missing fields read as JSON `null`.
    pub fn variable(
        mut self,
        name: impl Into<String>,
        kind: VariableKind,
        path: impl AsRef<str>,
    ) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                kind,
                pointer: to_pointer(path.as_ref()),
            },
        );
        self
    }

    /// Document kind this adapter reads.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

fn to_pointer(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        return path.to_string();
    }
    path.split('.')
        .map(|segment| segment.replace('~', "~0").replace('/', "~1"))
        .fold(String::new(), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment);
            pointer
        })
}

impl Argument for DocumentArguments {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies(&self, input: &Input) -> bool {
        input
            .downcast_ref::<Document>()
            .map(|doc| doc.kind == self.kind)
            .unwrap_or(false)
    }

    fn input_kind(&self) -> String {
        format!("document:{}", self.kind)
    }

    fn variable(&self, input: &Input, attribute: &str) -> ArgumentResult<Variable> {
        let field = self
            .fields
            .get(attribute)
            .ok_or_else(|| ArgumentError::UnknownVariable {
                argument: self.name.clone(),
                attribute: attribute.to_string(),
            })?;
        let doc = input
            .downcast_ref::<Document>()
            .ok_or_else(|| ArgumentError::Incompatible {
                argument: self.name.clone(),
                type_name: input.type_name(),
            })?;

        let raw = doc
            .body
            .pointer(&field.pointer)
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        field
            .kind
            .coerce(Variable::Value(raw))
            .map_err(|source| ArgumentError::Coercion {
                argument: self.name.clone(),
                attribute: attribute.to_string(),
                source,
            })
    }

    fn arguments(&self) -> Vec<(&str, VariableKind)> {
        self.fields
            .iter()
            .map(|(name, field)| (name.as_str(), field.kind))
            .collect()
    }
}
