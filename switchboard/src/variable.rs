//! Semantic variable containers.
//!
//! Every value an argument adapter extracts from an input is wrapped in a
//! [`Variable`]. Operators only ever see variables, so comparison,
//! truthiness and hashing rules live here rather than in each operator.
//!
//! # Comparison rules
//!
//! | Left \ Right | Integer | Float | Boolean | String |
//! |---|---|---|---|---|
//! | Integer | numeric | numeric | — | — |
//! | Float | numeric | numeric | — | — |
//! | Boolean | — | — | ordered | — |
//! | String | — | — | — | lexicographic |
//!
//! `—` means incomparable: equality is `false` and ordering is `None`.
//! Booleans are not numbers here: `true` is never equal to `1`.
//! Scalar JSON payloads held by [`Variable::Value`] are compared as the
//! matching scalar variant.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A value extracted from an input, tagged with its semantic type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variable {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
    /// Uncoerced payload; compared by its JSON shape.
    Value(serde_json::Value),
}

/// Semantic type a declared variable is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Integer,
    Float,
    Boolean,
    String,
    Value,
}

/// A raw value could not be coerced into the requested kind.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot coerce {value} into {kind}")]
pub struct CoercionError {
    pub kind: VariableKind,
    pub value: String,
}

impl VariableKind {
    /// Coerce a raw extracted value into this kind.
    pub fn coerce(self, raw: Variable) -> Result<Variable, CoercionError> {
        let fail = |raw: &Variable| CoercionError {
            kind: self,
            value: raw.to_string(),
        };

        match self {
            Self::Value => Ok(raw),
            Self::Boolean => Ok(Variable::Boolean(raw.is_truthy())),
            Self::String => Ok(Variable::String(raw.to_string())),
            Self::Integer => match raw.normalized().as_ref() {
                Variable::Integer(i) => Ok(Variable::Integer(*i)),
                Variable::Float(f) if f.is_finite() => Ok(Variable::Integer(f.trunc() as i64)),
                Variable::Boolean(b) => Ok(Variable::Integer(i64::from(*b))),
                Variable::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Variable::Integer)
                    .map_err(|_| fail(&raw)),
                _ => Err(fail(&raw)),
            },
            Self::Float => match raw.normalized().as_ref() {
                Variable::Integer(i) => Ok(Variable::Float(*i as f64)),
                Variable::Float(f) => Ok(Variable::Float(*f)),
                Variable::Boolean(b) => Ok(Variable::Float(if *b { 1.0 } else { 0.0 })),
                Variable::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Variable::Float)
                    .map_err(|_| fail(&raw)),
                _ => Err(fail(&raw)),
            },
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "boolean"),
            Self::String => write!(f, "string"),
            Self::Value => write!(f, "value"),
        }
    }
}

impl Variable {
    /// The semantic type of this container.
    pub fn kind(&self) -> VariableKind {
        match self {
            Self::Integer(_) => VariableKind::Integer,
            Self::Float(_) => VariableKind::Float,
            Self::Boolean(_) => VariableKind::Boolean,
            Self::String(_) => VariableKind::String,
            Self::Value(_) => VariableKind::Value,
        }
    }

    /// Truthiness of the wrapped value.
    ///
    /// Zero, empty strings, `false`, JSON `null` and empty JSON collections
    /// are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Boolean(b) => *b,
            Self::String(s) => !s.is_empty(),
            Self::Value(v) => match v {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
                serde_json::Value::String(s) => !s.is_empty(),
                serde_json::Value::Array(a) => !a.is_empty(),
                serde_json::Value::Object(o) => !o.is_empty(),
            },
        }
    }

    /// Compare two variables. `None` when the kinds are not mutually ordered.
    pub fn compare(&self, other: &Variable) -> Option<Ordering> {
        let left = self.normalized();
        let right = other.normalized();

        match (left.as_ref(), right.as_ref()) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.as_str().cmp(b.as_str())),
            (Self::Value(a), Self::Value(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Value-derived hash that is stable across processes.
    ///
    /// Booleans hash their kind name together with the value so that
    /// `true`/`false` do not land in the same bucket as `1`/`0`.
    pub fn stable_hash(&self) -> u64 {
        let digest = blake3::hash(self.hash_key().as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(head)
    }

    fn hash_key(&self) -> String {
        match self.normalized().as_ref() {
            Self::Integer(i) => i.to_string(),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e18 => {
                (*f as i64).to_string()
            }
            Self::Float(f) => f.to_string(),
            Self::Boolean(b) => format!("Boolean{}", b),
            Self::String(s) => s.clone(),
            Self::Value(v) => v.to_string(),
        }
    }

    /// Scalar JSON payloads unwrap into their scalar variant.
    fn normalized(&self) -> Cow<'_, Variable> {
        let Self::Value(value) = self else {
            return Cow::Borrowed(self);
        };
        match value {
            serde_json::Value::Bool(b) => Cow::Owned(Self::Boolean(*b)),
            serde_json::Value::String(s) => Cow::Owned(Self::String(s.clone())),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Cow::Owned(Self::Integer(i)),
                None => Cow::Owned(Self::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            _ => Cow::Borrowed(self),
        }
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Variable {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::String(s) => write!(f, "{}", s),
            Self::Value(serde_json::Value::String(s)) => write!(f, "{}", s),
            Self::Value(v) => write!(f, "{}", v),
        }
    }
}

macro_rules! variable_from {
    ($variant:ident, $($ty:ty => $conv:expr),+ $(,)?) => {
        $(
            impl From<$ty> for Variable {
                fn from(value: $ty) -> Self {
                    Self::$variant($conv(value))
                }
            }
        )+
    };
}

variable_from!(Integer, i64 => |v| v, i32 => i64::from, u32 => i64::from, i16 => i64::from, u16 => i64::from, u8 => i64::from);
variable_from!(Float, f64 => |v| v, f32 => f64::from);
variable_from!(Boolean, bool => |v| v);
variable_from!(String, String => |v| v, &str => str::to_string, &String => String::clone);
variable_from!(Value, serde_json::Value => |v| v);

impl<T: Into<Variable>> From<Option<T>> for Variable {
    fn from(value: Option<T>) -> Self {
        value
            .map(Into::into)
            .unwrap_or(Variable::Value(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_comparison_crosses_int_and_float() {
        assert!(Variable::Integer(3) < Variable::Float(3.5));
        assert_eq!(Variable::Integer(2), Variable::Float(2.0));
        assert!(Variable::Float(10.0) > Variable::Integer(9));
    }

    #[test]
    fn test_mixed_kinds_are_incomparable() {
        assert_eq!(Variable::from("5").compare(&Variable::Integer(5)), None);
        assert_ne!(Variable::Boolean(true), Variable::Integer(1));
    }

    #[test]
    fn test_json_scalars_compare_as_scalars() {
        assert_eq!(Variable::Value(json!(21)), Variable::Integer(21));
        assert_eq!(Variable::Value(json!("a")), Variable::from("a"));
        assert!(Variable::Value(json!(1.5)) < Variable::Integer(2));
        assert_eq!(Variable::Value(json!([1, 2])), Variable::Value(json!([1, 2])));
        assert_eq!(
            Variable::Value(json!([1])).compare(&Variable::Value(json!([2]))),
            None
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!Variable::Integer(0).is_truthy());
        assert!(Variable::Integer(-1).is_truthy());
        assert!(!Variable::Float(0.0).is_truthy());
        assert!(!Variable::from("").is_truthy());
        assert!(Variable::from("x").is_truthy());
        assert!(!Variable::Value(json!(null)).is_truthy());
        assert!(!Variable::Value(json!({})).is_truthy());
        assert!(Variable::Value(json!([0])).is_truthy());
    }

    #[test]
    fn test_coerce_integer() {
        let kind = VariableKind::Integer;
        assert_eq!(kind.coerce(Variable::from(" 42 ")).unwrap(), Variable::Integer(42));
        assert_eq!(kind.coerce(Variable::Float(9.9)).unwrap(), Variable::Integer(9));
        assert_eq!(kind.coerce(Variable::Boolean(true)).unwrap(), Variable::Integer(1));
        assert_eq!(kind.coerce(Variable::Value(json!(7))).unwrap(), Variable::Integer(7));

        let err = kind.coerce(Variable::from("forty")).unwrap_err();
        assert_eq!(err.kind, VariableKind::Integer);
        assert!(kind.coerce(Variable::Value(json!(null))).is_err());
    }

    #[test]
    fn test_coerce_boolean_and_string() {
        assert_eq!(
            VariableKind::Boolean.coerce(Variable::from("no")).unwrap(),
            Variable::Boolean(true)
        );
        assert_eq!(
            VariableKind::Boolean.coerce(Variable::Integer(0)).unwrap(),
            Variable::Boolean(false)
        );
        assert_eq!(
            VariableKind::String.coerce(Variable::Integer(12)).unwrap(),
            Variable::from("12")
        );
        assert_eq!(
            VariableKind::String.coerce(Variable::Value(json!("plain"))).unwrap(),
            Variable::from("plain")
        );
    }

    #[test]
    fn test_value_coercion_is_identity() {
        let raw = Variable::Value(json!({"a": 1}));
        assert_eq!(VariableKind::Value.coerce(raw.clone()).unwrap(), raw);
    }

    #[test]
    fn test_stable_hash_is_deterministic() {
        let v = Variable::from("user-1234");
        assert_eq!(v.stable_hash(), Variable::from("user-1234").stable_hash());
        assert_eq!(Variable::Integer(5).stable_hash(), Variable::Float(5.0).stable_hash());
        assert_eq!(
            Variable::Value(json!(5)).stable_hash(),
            Variable::Integer(5).stable_hash()
        );
    }

    #[test]
    fn test_boolean_hash_decorrelated_from_integers() {
        assert_ne!(Variable::Boolean(true).stable_hash(), Variable::Integer(1).stable_hash());
        assert_ne!(Variable::Boolean(false).stable_hash(), Variable::Integer(0).stable_hash());
    }

    #[test]
    fn test_untagged_deserialize() {
        let vars: Vec<Variable> = serde_json::from_str(r#"[1, 2.5, true, "x", [1]]"#).unwrap();
        assert_eq!(vars[0].kind(), VariableKind::Integer);
        assert_eq!(vars[1].kind(), VariableKind::Float);
        assert_eq!(vars[2].kind(), VariableKind::Boolean);
        assert_eq!(vars[3].kind(), VariableKind::String);
        assert_eq!(vars[4].kind(), VariableKind::Value);
    }

    #[test]
    fn test_option_none_becomes_null() {
        let v: Variable = Option::<i64>::None.into();
        assert!(!v.is_truthy());
        assert_eq!(Variable::from(Some(3)), Variable::Integer(3));
    }
}
