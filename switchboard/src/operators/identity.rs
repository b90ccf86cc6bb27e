//! Truthiness operator.

use std::fmt;

use super::{ApplyResult, Operator, OperatorInfo};
use crate::variable::Variable;

/// Holds when the value is truthy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Truthy;

impl Truthy {
    pub const INFO: OperatorInfo = OperatorInfo {
        name: "true",
        group: "identity",
        preposition: "true",
        arguments: &[],
    };
}

impl Operator for Truthy {
    fn name(&self) -> &'static str {
        Self::INFO.name
    }
    fn group(&self) -> &'static str {
        Self::INFO.group
    }
    fn preposition(&self) -> &'static str {
        Self::INFO.preposition
    }
    fn arguments(&self) -> &'static [&'static str] {
        Self::INFO.arguments
    }
    fn params(&self) -> Vec<Variable> {
        Vec::new()
    }

    fn applies_to(&self, value: &Variable) -> ApplyResult<bool> {
        Ok(value.is_truthy())
    }
}

impl fmt::Display for Truthy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "true")
    }
}
