//! Operator library
//!
//! An operator is a stateless predicate configured at construction time
//! ("equal to 5", "between 1 and 10", "in 20%") and applied to the
//! [`Variable`] a condition extracts from an input.
//!
//! # Standard operators
//!
//! | Name | Group | Arguments |
//! |---|---|---|
//! | `true` | identity | — |
//! | `equals` | comparable | `value` |
//! | `between` | comparable | `lower_limit`, `upper_limit` |
//! | `less_than` | comparable | `upper_limit` |
//! | `less_than_or_equal_to` | comparable | `upper_limit` |
//! | `more_than` | comparable | `lower_limit` |
//! | `more_than_or_equal_to` | comparable | `lower_limit` |
//! | `percent` | misc | `percentage` |
//! | `percent_range` | misc | `lower_limit`, `upper_limit` |
//! | `matches` | string | `pattern` |
//!
//! Operators are built either directly with their typed constructors or by
//! name from a parameter map via [`build`], which validates that every
//! required argument is present.

pub mod comparable;
pub mod identity;
pub mod pattern;
pub mod percent;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::variable::{Variable, VariableKind};

pub use comparable::{
    Between, Equals, LessThan, LessThanOrEqualTo, MoreThan, MoreThanOrEqualTo,
};
pub use identity::Truthy;
pub use pattern::Matches;
pub use percent::{Percent, PercentRange};

/// Named construction parameters for [`build`].
pub type Params = BTreeMap<String, Variable>;

/// Errors raised while constructing an operator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperatorError {
    #[error("unknown operator '{0}'")]
    Unknown(String),

    #[error("operator '{operator}' requires argument '{argument}'")]
    MissingArgument {
        operator: &'static str,
        argument: &'static str,
    },

    #[error("operator '{operator}' argument '{argument}' is invalid: {reason}")]
    InvalidArgument {
        operator: &'static str,
        argument: &'static str,
        reason: String,
    },
}

/// Result type for operator construction
pub type OperatorResult<T> = Result<T, OperatorError>;

/// Errors raised while applying an operator to a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApplyError {
    #[error("cannot compare {left} with {right}")]
    Incomparable { left: String, right: String },

    #[error("{0}")]
    Failed(String),
}

/// Result type for operator application
pub type ApplyResult<T> = Result<T, ApplyError>;

/// A parameterized predicate over a [`Variable`].
///
/// Implementations must be pure: `applies_to` may not mutate anything and
/// must return the same answer for the same value.
pub trait Operator: fmt::Debug + fmt::Display + Send + Sync {
    /// Unique short identifier (e.g. `"equals"`).
    fn name(&self) -> &'static str;

    /// Category tag (e.g. `"comparable"`).
    fn group(&self) -> &'static str;

    /// Human-readable phrase used when describing conditions.
    fn preposition(&self) -> &'static str;

    /// Ordered constructor argument names.
    fn arguments(&self) -> &'static [&'static str];

    /// Constructor argument values, in [`Operator::arguments`] order.
    fn params(&self) -> Vec<Variable>;

    /// Whether the operator holds for `value`.
    fn applies_to(&self, value: &Variable) -> ApplyResult<bool>;
}

/// Two operators are the same iff they share a name and parameter values.
pub fn same_operator(a: &dyn Operator, b: &dyn Operator) -> bool {
    a.name() == b.name() && a.params() == b.params()
}

/// Named parameter view of an operator, for display and serialization.
pub fn named_params(operator: &dyn Operator) -> BTreeMap<&'static str, Variable> {
    operator
        .arguments()
        .iter()
        .copied()
        .zip(operator.params())
        .collect()
}

/// Static description of a standard operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorInfo {
    pub name: &'static str,
    pub group: &'static str,
    pub preposition: &'static str,
    pub arguments: &'static [&'static str],
}

type Builder = fn(&Params) -> OperatorResult<Arc<dyn Operator>>;

fn shared<O: Operator + 'static>(operator: O) -> Arc<dyn Operator> {
    Arc::new(operator)
}

fn registry() -> [(OperatorInfo, Builder); 10] {
    [
        (Truthy::INFO, |_| Ok(shared(Truthy))),
        (Equals::INFO, |p| Equals::from_params(p).map(shared)),
        (Between::INFO, |p| Between::from_params(p).map(shared)),
        (LessThan::INFO, |p| LessThan::from_params(p).map(shared)),
        (LessThanOrEqualTo::INFO, |p| {
            LessThanOrEqualTo::from_params(p).map(shared)
        }),
        (MoreThan::INFO, |p| MoreThan::from_params(p).map(shared)),
        (MoreThanOrEqualTo::INFO, |p| {
            MoreThanOrEqualTo::from_params(p).map(shared)
        }),
        (Percent::INFO, |p| Percent::from_params(p).map(shared)),
        (PercentRange::INFO, |p| PercentRange::from_params(p).map(shared)),
        (Matches::INFO, |p| Matches::from_params(p).map(shared)),
    ]
}

/// Every standard operator, in documentation order.
pub fn catalog() -> Vec<OperatorInfo> {
    registry().into_iter().map(|(info, _)| info).collect()
}

/// Build a standard operator by name from named parameters.
pub fn build(name: &str, params: &Params) -> OperatorResult<Arc<dyn Operator>> {
    let (_, builder) = registry()
        .into_iter()
        .find(|(info, _)| info.name == name)
        .ok_or_else(|| OperatorError::Unknown(name.to_string()))?;
    builder(params)
}

/// Fetch a required parameter.
pub(crate) fn require(
    operator: &'static str,
    params: &Params,
    argument: &'static str,
) -> OperatorResult<Variable> {
    params
        .get(argument)
        .cloned()
        .ok_or(OperatorError::MissingArgument { operator, argument })
}

/// Fetch a required numeric parameter.
pub(crate) fn require_number(
    operator: &'static str,
    params: &Params,
    argument: &'static str,
) -> OperatorResult<f64> {
    match VariableKind::Float.coerce(require(operator, params, argument)?) {
        Ok(Variable::Float(f)) if f.is_finite() => Ok(f),
        Ok(other) => Err(OperatorError::InvalidArgument {
            operator,
            argument,
            reason: format!("{} is not a finite number", other),
        }),
        Err(e) => Err(OperatorError::InvalidArgument {
            operator,
            argument,
            reason: e.to_string(),
        }),
    }
}

/// Order `value` against `limit`, failing when the kinds are not comparable.
pub(crate) fn ordering(value: &Variable, limit: &Variable) -> ApplyResult<Ordering> {
    value
        .compare(limit)
        .ok_or_else(|| ApplyError::Incomparable {
            left: format!("{} {:?}", value.kind(), value.to_string()),
            right: format!("{} {:?}", limit.kind(), limit.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, Variable)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_catalog_lists_every_operator_once() {
        let names: Vec<&str> = catalog().iter().map(|i| i.name).collect();
        assert_eq!(names.len(), 10);
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
        assert!(names.contains(&"percent_range"));
    }

    #[test]
    fn test_build_by_name() {
        let op = build("between", &params(&[
            ("lower_limit", Variable::Integer(1)),
            ("upper_limit", Variable::Integer(10)),
        ]))
        .unwrap();
        assert_eq!(op.name(), "between");
        assert!(op.applies_to(&Variable::Integer(5)).unwrap());
        assert!(!op.applies_to(&Variable::Integer(10)).unwrap());
    }

    #[test]
    fn test_build_missing_argument() {
        let err = build("between", &params(&[("lower_limit", Variable::Integer(1))])).unwrap_err();
        assert_eq!(
            err,
            OperatorError::MissingArgument {
                operator: "between",
                argument: "upper_limit"
            }
        );
        assert_eq!(err.to_string(), "operator 'between' requires argument 'upper_limit'");
    }

    #[test]
    fn test_build_unknown_operator() {
        let err = build("approximately", &Params::new()).unwrap_err();
        assert_eq!(err, OperatorError::Unknown("approximately".to_string()));
    }

    #[test]
    fn test_build_truthy_needs_no_params() {
        let op = build("true", &Params::new()).unwrap();
        assert!(op.applies_to(&Variable::from("x")).unwrap());
    }

    #[test]
    fn test_percent_rejects_non_numeric() {
        let err = build("percent", &params(&[("percentage", Variable::from("lots"))])).unwrap_err();
        assert!(matches!(err, OperatorError::InvalidArgument { argument: "percentage", .. }));
    }

    #[test]
    fn test_same_operator_compares_params() {
        let a = Equals::new(5);
        let b = Equals::new(5);
        let c = Equals::new(6);
        let d = MoreThan::new(5);
        assert!(same_operator(&a, &b));
        assert!(!same_operator(&a, &c));
        assert!(!same_operator(&a, &d));
    }

    #[test]
    fn test_named_params() {
        let op = Between::new(1, 9);
        let named = named_params(&op);
        assert_eq!(named.get("lower_limit"), Some(&Variable::Integer(1)));
        assert_eq!(named.get("upper_limit"), Some(&Variable::Integer(9)));
    }
}
