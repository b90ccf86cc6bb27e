//! Runtime inputs handed to switch evaluation.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Sentinel meaning "no real input was supplied".
///
/// `Manager::active` evaluates switches against this when the combined
/// input list is empty. Conditions never match it.
pub const NONE_INPUT: Input = Input::NONE;

/// A type-erased, cheaply clonable handle to an input object.
#[derive(Clone)]
pub struct Input {
    value: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &'static str,
}

impl Input {
    /// The "no input" sentinel.
    pub const NONE: Input = Input {
        value: None,
        type_name: "None",
    };

    /// Wrap an input object.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Arc::new(value) as Arc<dyn Any + Send + Sync>),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an already shared input object.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value: Some(value as Arc<dyn Any + Send + Sync>),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Whether this is the [`NONE_INPUT`] sentinel.
    pub fn is_none(&self) -> bool {
        self.value.is_none()
    }

    /// Borrow the wrapped object if its concrete type is exactly `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_deref().and_then(|v| v.downcast_ref::<T>())
    }

    /// Concrete type of the wrapped object.
    pub fn type_id(&self) -> Option<TypeId> {
        self.value.as_deref().map(|v| v.type_id())
    }

    /// Name of the wrapped type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input({})", self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User {
        age: u32,
    }

    #[test]
    fn test_none_sentinel() {
        assert!(NONE_INPUT.is_none());
        assert!(NONE_INPUT.downcast_ref::<User>().is_none());
        assert_eq!(NONE_INPUT.type_id(), None);
    }

    #[test]
    fn test_downcast_exact_type() {
        let input = Input::new(User { age: 30 });
        assert!(!input.is_none());
        assert_eq!(input.downcast_ref::<User>().map(|u| u.age), Some(30));
        assert!(input.downcast_ref::<String>().is_none());
        assert_eq!(input.type_id(), Some(TypeId::of::<User>()));
    }

    #[test]
    fn test_clone_shares_value() {
        let input = Input::new(String::from("shared"));
        let copy = input.clone();
        assert_eq!(copy.downcast_ref::<String>().map(String::as_str), Some("shared"));
        assert!(format!("{:?}", copy).contains("String"));
    }
}
