//! Switch storage backends
//!
//! The manager owns key construction (namespace path plus switch name);
//! backends treat keys as opaque strings. Stored switches are detached
//! copies: they carry no manager and a clean change set.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::switch::Switch;

/// Error type for storage operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Shared reference to a storage backend
pub type SharedStorage = Arc<dyn Storage>;

/// Key/value mapping from namespaced key to switch.
///
/// No transactional guarantees are assumed across calls; read-modify-write
/// sequences issued by the manager are last-write-wins.
pub trait Storage: Send + Sync {
    /// Fetch a switch, `None` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<Switch>>;

    /// Insert or replace a switch.
    fn set(&self, key: &str, switch: Switch) -> StorageResult<()>;

    /// Remove a key; removing an absent key is not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Every `(key, switch)` pair.
    fn entries(&self) -> StorageResult<Vec<(String, Switch)>>;
}

/// In-process storage ordered by key.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    switches: RwLock<BTreeMap<String, Switch>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared reference to this storage
    pub fn shared(self) -> SharedStorage {
        Arc::new(self)
    }

    pub fn len(&self) -> usize {
        self.switches.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Switch>> {
        let switches = self
            .switches
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(switches.get(key).cloned())
    }

    fn set(&self, key: &str, switch: Switch) -> StorageResult<()> {
        let mut switches = self
            .switches
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        switches.insert(key.to_string(), switch.detached());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let mut switches = self
            .switches
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        switches.remove(key);
        Ok(())
    }

    fn entries(&self) -> StorageResult<Vec<(String, Switch)>> {
        let switches = self
            .switches
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(switches
            .iter()
            .map(|(key, switch)| (key.clone(), switch.clone()))
            .collect())
    }
}
