//! Conditions bind an argument adapter, one of its variables and an operator.

use std::fmt;
use std::sync::Arc;

use serde_json::json;

use crate::arguments::{ArgumentResult, SharedArgument};
use crate::input::Input;
use crate::operators::{named_params, same_operator, Operator};
use crate::signals::{Signals, SwitchEvent};

/// A single testable rule: `<Argument>.<attribute> <operator>`, optionally
/// negated.
#[derive(Clone)]
pub struct Condition {
    argument: SharedArgument,
    attribute: String,
    operator: Arc<dyn Operator>,
    negative: bool,
}

impl Condition {
    pub fn new<O>(argument: SharedArgument, attribute: impl Into<String>, operator: O) -> Self
    where
        O: Operator + 'static,
    {
        Self::with_operator(argument, attribute, Arc::new(operator))
    }

    /// Build from an already shared operator, e.g. one from
    /// [`operators::build`](crate::operators::build).
    pub fn with_operator(
        argument: SharedArgument,
        attribute: impl Into<String>,
        operator: Arc<dyn Operator>,
    ) -> Self {
        Self {
            argument,
            attribute: attribute.into(),
            operator,
            negative: false,
        }
    }

    /// Invert the operator's result.
    pub fn negated(mut self) -> Self {
        self.negative = !self.negative;
        self
    }

    pub fn argument(&self) -> &SharedArgument {
        &self.argument
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn operator(&self) -> &dyn Operator {
        self.operator.as_ref()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Evaluate against one input.
    ///
    /// The sentinel input and inputs the adapter cannot read yield `false`
    /// without touching the operator. Extraction errors propagate. An
    /// operator failure yields `false` (negation is not applied) and is
    /// reported on `condition_apply_error`.
    pub fn call(&self, input: &Input, signals: &Signals) -> ArgumentResult<bool> {
        if input.is_none() || !self.argument.applies(input) {
            return Ok(false);
        }

        let value = self.argument.variable(input, &self.attribute)?;

        match self.operator.applies_to(&value) {
            Ok(result) => Ok(result != self.negative),
            Err(error) => {
                signals.emit(SwitchEvent::ConditionApplyError {
                    condition: self,
                    input,
                    error: &error,
                });
                Ok(false)
            }
        }
    }

    /// JSON form used in switch change sets and CLI output.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "argument": self.argument.name(),
            "attribute": self.attribute,
            "operator": self.operator.name(),
            "params": named_params(self.operator.as_ref()),
            "negative": self.negative,
        })
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.argument.name() == other.argument.name()
            && self.argument.input_kind() == other.argument.input_kind()
            && self.attribute == other.attribute
            && same_operator(self.operator.as_ref(), other.operator.as_ref())
            && self.negative == other.negative
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "{} not {}", self.argument.describe(&self.attribute), self.operator)
        } else {
            write!(f, "{} {}", self.argument.describe(&self.attribute), self.operator)
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("argument", &self.argument.name())
            .field("attribute", &self.attribute)
            .field("operator", &self.operator)
            .field("negative", &self.negative)
            .finish()
    }
}
