//! Equality and ordering operators.
//!
//! Limits are plain [`Variable`]s, so the same operator works for numbers,
//! strings or booleans. Ordering a value against a limit of another kind
//! is an [`ApplyError`](super::ApplyError).

use std::cmp::Ordering;
use std::fmt;

use super::{ordering, require, ApplyResult, Operator, OperatorInfo, OperatorResult, Params};
use crate::variable::Variable;

const COMPARABLE: &str = "comparable";

/// Holds when the value equals a configured value.
#[derive(Debug, Clone, PartialEq)]
pub struct Equals {
    pub value: Variable,
}

impl Equals {
    pub const INFO: OperatorInfo = OperatorInfo {
        name: "equals",
        group: COMPARABLE,
        preposition: "equal to",
        arguments: &["value"],
    };

    pub fn new(value: impl Into<Variable>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn from_params(params: &Params) -> OperatorResult<Self> {
        Ok(Self::new(require(Self::INFO.name, params, "value")?))
    }
}

impl Operator for Equals {
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
        vec![self.value.clone()]
    }

    fn applies_to(&self, value: &Variable) -> ApplyResult<bool> {
        Ok(*value == self.value)
    }
}

impl fmt::Display for Equals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.preposition(), self.value)
    }
}

/// Holds when `lower_limit < value < upper_limit` (exclusive at both ends).
#[derive(Debug, Clone, PartialEq)]
pub struct Between {
    pub lower_limit: Variable,
    pub upper_limit: Variable,
}

impl Between {
    pub const INFO: OperatorInfo = OperatorInfo {
        name: "between",
        group: COMPARABLE,
        preposition: "between",
        arguments: &["lower_limit", "upper_limit"],
    };

    pub fn new(lower_limit: impl Into<Variable>, upper_limit: impl Into<Variable>) -> Self {
        Self {
            lower_limit: lower_limit.into(),
            upper_limit: upper_limit.into(),
        }
    }

    pub fn from_params(params: &Params) -> OperatorResult<Self> {
        Ok(Self::new(
            require(Self::INFO.name, params, "lower_limit")?,
            require(Self::INFO.name, params, "upper_limit")?,
        ))
    }
}

impl Operator for Between {
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
        vec![self.lower_limit.clone(), self.upper_limit.clone()]
    }

    fn applies_to(&self, value: &Variable) -> ApplyResult<bool> {
        Ok(ordering(value, &self.lower_limit)? == Ordering::Greater
            && ordering(value, &self.upper_limit)? == Ordering::Less)
    }
}

impl fmt::Display for Between {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" and \"{}\"",
            self.preposition(),
            self.lower_limit,
            self.upper_limit
        )
    }
}

/// Operators comparing against a single bound share everything but their
/// identity and the accepted orderings.
macro_rules! bound_operator {
    (
        $(#[$doc:meta])*
        $ty:ident, $name:literal, $preposition:literal, $field:ident, $($accept:pat_param)|+
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $ty {
            pub $field: Variable,
        }

        impl $ty {
            pub const INFO: OperatorInfo = OperatorInfo {
                name: $name,
                group: COMPARABLE,
                preposition: $preposition,
                arguments: &[stringify!($field)],
            };

            pub fn new($field: impl Into<Variable>) -> Self {
                Self {
                    $field: $field.into(),
                }
            }

            pub fn from_params(params: &Params) -> OperatorResult<Self> {
                Ok(Self::new(require(
                    Self::INFO.name,
                    params,
                    stringify!($field),
                )?))
            }
        }

        impl Operator for $ty {
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
                vec![self.$field.clone()]
            }

            fn applies_to(&self, value: &Variable) -> ApplyResult<bool> {
                Ok(matches!(ordering(value, &self.$field)?, $($accept)|+))
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} \"{}\"", self.preposition(), self.$field)
            }
        }
    };
}

bound_operator!(
    /// Holds when `value < upper_limit`.
    LessThan, "less_than", "less than", upper_limit, Ordering::Less
);

bound_operator!(
    /// Holds when `value <= upper_limit`.
    LessThanOrEqualTo, "less_than_or_equal_to", "less than or equal to", upper_limit,
    Ordering::Less | Ordering::Equal
);

bound_operator!(
    /// Holds when `value > lower_limit`.
    MoreThan, "more_than", "more than", lower_limit, Ordering::Greater
);

bound_operator!(
    /// Holds when `value >= lower_limit`.
    MoreThanOrEqualTo, "more_than_or_equal_to", "more than or equal to", lower_limit,
    Ordering::Greater | Ordering::Equal
);
