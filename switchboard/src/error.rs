//! Error types for switch management

use crate::arguments::ArgumentError;
use crate::storage::StorageError;

/// Errors surfaced by the manager and by switch evaluation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SwitchError {
    #[error("switch '{name}' not found in namespace '{namespace}'")]
    NotFound { name: String, namespace: String },

    #[error("switch name must not be blank")]
    BlankName,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),
}

/// Result type for switch operations
pub type SwitchResult<T> = Result<T, SwitchError>;
