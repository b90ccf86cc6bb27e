//! Regular expression operator.

use std::fmt;

use regex::Regex;

use super::{require, ApplyResult, Operator, OperatorError, OperatorInfo, OperatorResult, Params};
use crate::variable::Variable;

/// Holds when the value's string form matches a regular expression.
#[derive(Debug, Clone)]
pub struct Matches {
    regex: Regex,
}

impl Matches {
    pub const INFO: OperatorInfo = OperatorInfo {
        name: "matches",
        group: "string",
        preposition: "matching",
        arguments: &["pattern"],
    };

    /// Compile `pattern`; an invalid pattern is rejected here rather than
    /// at evaluation time.
    pub fn new(pattern: &str) -> OperatorResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| OperatorError::InvalidArgument {
            operator: Self::INFO.name,
            argument: "pattern",
            reason: e.to_string(),
        })?;
        Ok(Self { regex })
    }

    pub fn from_params(params: &Params) -> OperatorResult<Self> {
        let pattern = require(Self::INFO.name, params, "pattern")?;
        Self::new(&pattern.to_string())
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Operator for Matches {
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
        vec![Variable::from(self.pattern())]
    }

    fn applies_to(&self, value: &Variable) -> ApplyResult<bool> {
        Ok(self.regex.is_match(&value.to_string()))
    }
}

impl fmt::Display for Matches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.preposition(), self.pattern())
    }
}
