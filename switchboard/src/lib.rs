//! Switchboard — Runtime Feature Switches
//!
//! This library provides:
//! - Named switches with a state (disabled, selective, global), ordered
//!   conditions and colon-derived parent switches
//! - Argument adapters that read typed variables out of runtime inputs
//! - A standard operator library (equality, bounds, ranges, percentage
//!   buckets, regex)
//! - A namespaced registry answering "is this switch active for these
//!   inputs?" with per-context ambient inputs
//! - A signal bus for observing registrations, checks and activations
//!
//! # Usage
//!
//! ```rust,ignore
//! use switchboard::{Arguments, Condition, Input, Manager, Switch, SwitchState};
//! use switchboard::operators::MoreThanOrEqualTo;
//!
//! struct User { age: i64 }
//!
//! let users = Arguments::<User>::new("User").integer("age", |u| u.age).shared();
//! let manager = Manager::default();
//! manager.register(
//!     &mut Switch::new("beta")
//!         .with_state(SwitchState::Selective)
//!         .with_condition(Condition::new(users, "age", MoreThanOrEqualTo::new(21))),
//! )?;
//!
//! assert!(manager.active("beta", &[Input::new(User { age: 25 })])?);
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod arguments;
pub mod condition;
pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod input;
pub mod manager;
pub mod operators;
pub mod signals;
pub mod storage;
pub mod switch;
pub mod variable;

// Re-export key engine types
pub use arguments::{Argument, ArgumentError, ArgumentResult, Arguments, Document, DocumentArguments};
pub use condition::Condition;
pub use config::ManagerConfig;
pub use definition::{DefinitionError, DefinitionResult, Definitions};
pub use error::{SwitchError, SwitchResult};
pub use input::{Input, NONE_INPUT};
pub use manager::{Manager, ManagerBuilder};
pub use operators::{ApplyError, Operator, OperatorError};
pub use signals::{Signal, Signals, SwitchEvent};
pub use storage::{MemoryStorage, Storage, StorageError, StorageResult};
pub use switch::{Change, Switch, SwitchState};
pub use variable::{Variable, VariableKind};
