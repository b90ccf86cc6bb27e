//! Switch registry and activation decisions
//!
//! A [`Manager`] stores switches under namespaced keys, wires implicit
//! parent/child relationships, owns the signal bus and answers
//! [`Manager::active`] queries against ambient and explicit inputs.
//!
//! # Keys
//!
//! ```text
//! namespace ["shop", "eu"] + switch "checkout:v2"  →  "shop.eu.checkout:v2"
//! ```
//!
//! Colons in a switch name denote hierarchy (`"checkout:v2"` has the
//! implicit parent `"checkout"`); dots belong to the namespace.
//!
//! # Usage
//!
//! ```rust,ignore
//! use switchboard::{Manager, Switch, SwitchState, Input};
//!
//! let manager = Manager::builder().autocreate(true).build();
//! manager.register(&mut Switch::new("beta").with_state(SwitchState::Global))?;
//!
//! manager.input([Input::new(current_user)]);
//! if manager.active("beta", &[])? {
//!     // ...
//! }
//! manager.flush();
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ManagerConfig, DEFAULT_NAMESPACE, NAMESPACE_SEPARATOR};
use crate::context;
use crate::error::{SwitchError, SwitchResult};
use crate::input::{Input, NONE_INPUT};
use crate::signals::{Signals, SwitchEvent};
use crate::storage::{MemoryStorage, SharedStorage};
use crate::switch::Switch;

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by a manager and all of its namespaced views.
struct Shared {
    id: u64,
    storage: SharedStorage,
    autocreate: bool,
    signals: Signals,
}

impl Drop for Shared {
    fn drop(&mut self) {
        context::release(self.id);
    }
}

/// Which signal a registration announces on.
#[derive(Debug, Clone, Copy)]
enum Announce {
    Registered,
    Updated,
}

/// Switch registry bound to one namespace.
///
/// Cloning is cheap; clones and [`Manager::namespaced`] views share storage,
/// signals and ambient inputs.
#[derive(Clone)]
pub struct Manager {
    shared: Arc<Shared>,
    namespace: Vec<String>,
}

impl Manager {
    /// Create a manager over `storage` with default configuration.
    pub fn new(storage: SharedStorage) -> Self {
        Self::from_config(storage, &ManagerConfig::default())
    }

    pub fn from_config(storage: SharedStorage, config: &ManagerConfig) -> Self {
        let namespace = if config.namespace.is_empty() {
            vec![DEFAULT_NAMESPACE.to_string()]
        } else {
            config.namespace.clone()
        };
        Self {
            shared: Arc::new(Shared {
                id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
                storage,
                autocreate: config.autocreate,
                signals: Signals::new(),
            }),
            namespace,
        }
    }

    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::default()
    }

    pub fn signals(&self) -> &Signals {
        &self.shared.signals
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.shared.storage
    }

    pub fn autocreate(&self) -> bool {
        self.shared.autocreate
    }

    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    /// Namespace joined with the separator, e.g. `shop.eu`.
    pub fn namespace_path(&self) -> String {
        self.namespace.join(NAMESPACE_SEPARATOR)
    }

    fn is_default_namespace(&self) -> bool {
        self.namespace.len() == 1 && self.namespace[0] == DEFAULT_NAMESPACE
    }

    /// Storage key for `name` in this namespace.
    pub fn key(&self, name: &str) -> String {
        format!("{}{}{}", self.namespace_path(), NAMESPACE_SEPARATOR, name)
    }

    /// A view of the same registry under a sub-namespace.
    ///
    /// From the default namespace the view starts a fresh path; otherwise
    /// `sub` extends the current path.
    pub fn namespaced(&self, sub: impl Into<String>) -> Manager {
        let mut namespace = if self.is_default_namespace() {
            Vec::new()
        } else {
            self.namespace.clone()
        };
        namespace.push(sub.into());
        Manager {
            shared: Arc::clone(&self.shared),
            namespace,
        }
    }

    /// Switches registered directly in this namespace.
    ///
    /// Switches of sub-namespaces are not listed.
    pub fn switches(&self) -> SwitchResult<Vec<Switch>> {
        let prefix = format!("{}{}", self.namespace_path(), NAMESPACE_SEPARATOR);
        Ok(self
            .shared
            .storage
            .entries()?
            .into_iter()
            .filter(|(key, _)| {
                key.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.is_empty() && !rest.contains(NAMESPACE_SEPARATOR))
            })
            .map(|(_, mut switch)| {
                switch.attach(self.clone());
                switch
            })
            .collect())
    }

    /// Look up a switch, creating a disabled one when autocreate is on.
    pub fn switch(&self, name: &str) -> SwitchResult<Switch> {
        if let Some(mut switch) = self.shared.storage.get(&self.key(name))? {
            switch.attach(self.clone());
            return Ok(switch);
        }

        if !self.shared.autocreate {
            return Err(SwitchError::NotFound {
                name: name.to_string(),
                namespace: self.namespace_path(),
            });
        }

        debug!(switch = name, namespace = %self.namespace_path(), "Autocreating switch");
        let mut switch = Switch::new(name);
        self.register(&mut switch)?;
        Ok(switch)
    }

    /// Persist a switch, wire its implicit parent and announce it.
    pub fn register(&self, switch: &mut Switch) -> SwitchResult<()> {
        self.register_as(switch, Announce::Registered)
    }

    fn register_as(&self, switch: &mut Switch, announce: Announce) -> SwitchResult<()> {
        if switch.name().trim().is_empty() {
            return Err(SwitchError::BlankName);
        }

        switch.attach(self.clone());

        let key = self.key(switch.name());
        if let Some(stored) = self.shared.storage.get(&key)? {
            // Children are owned by the registry; a caller's copy may be stale.
            switch.children = stored.children;
        }

        if let Some(parent_name) = implicit_parent(switch.name()) {
            let parent_key = self.key(parent_name);
            if let Some(mut parent) = self.shared.storage.get(&parent_key)? {
                if !parent.children.iter().any(|child| child == switch.name()) {
                    parent.children.push(switch.name().to_string());
                    self.shared.storage.set(&parent_key, parent)?;
                }
                switch.parent = Some(parent_name.to_string());
            }
        }

        self.shared.storage.set(&key, switch.clone())?;

        debug!(
            switch = switch.name(),
            namespace = %self.namespace_path(),
            state = %switch.state,
            ?announce,
            "Switch persisted"
        );

        let event = match announce {
            Announce::Registered => SwitchEvent::Registered(switch),
            Announce::Updated => SwitchEvent::Updated(switch),
        };
        self.shared.signals.emit(event);
        Ok(())
    }

    /// Remove a switch and, first, all of its descendants.
    pub fn unregister(&self, switch: impl AsRef<str>) -> SwitchResult<()> {
        let name = switch.as_ref();
        let key = self.key(name);
        let mut switch =
            self.shared
                .storage
                .get(&key)?
                .ok_or_else(|| SwitchError::NotFound {
                    name: name.to_string(),
                    namespace: self.namespace_path(),
                })?;

        for child in &switch.children {
            match self.unregister(child) {
                Err(SwitchError::NotFound { .. }) => {
                    warn!(switch = name, child = %child, "Listed child missing from storage");
                }
                other => other?,
            }
        }

        self.shared.storage.delete(&key)?;

        if let Some(parent_name) = &switch.parent {
            let parent_key = self.key(parent_name);
            if let Some(mut parent) = self.shared.storage.get(&parent_key)? {
                parent.children.retain(|child| child != name);
                self.shared.storage.set(&parent_key, parent)?;
            }
        }

        debug!(switch = name, namespace = %self.namespace_path(), "Switch unregistered");

        switch.attach(self.clone());
        self.shared.signals.emit(SwitchEvent::Unregistered(&switch));
        Ok(())
    }

    /// Persist changes to a registered switch.
    ///
    /// Announces on `switch_updated`, clears the switch's change set and
    /// re-points every listed child at this switch.
    pub fn update(&self, switch: &mut Switch) -> SwitchResult<()> {
        self.register_as(switch, Announce::Updated)?;
        switch.reset();

        for child_name in &switch.children {
            let key = self.key(child_name);
            match self.shared.storage.get(&key)? {
                Some(mut child) => {
                    child.parent = Some(switch.name().to_string());
                    self.shared.storage.set(&key, child)?;
                }
                None => {
                    warn!(switch = switch.name(), child = %child_name, "Listed child missing from storage");
                }
            }
        }
        Ok(())
    }

    /// Replace the ambient inputs of the current execution context.
    ///
    /// Inputs stay until [`Manager::flush`], the end of the enclosing
    /// [`context::scope`] or thread exit. Dropping the last handle to a
    /// manager releases them only on the dropping thread.
    pub fn input<I>(&self, inputs: I)
    where
        I: IntoIterator<Item = Input>,
    {
        context::set(self.shared.id, inputs.into_iter().collect());
    }

    /// Clear the ambient inputs of the current execution context.
    pub fn flush(&self) {
        context::clear(self.shared.id);
    }

    /// Ambient inputs of the current execution context.
    pub fn inputs(&self) -> Vec<Input> {
        context::get(self.shared.id)
    }

    /// Whether switch `name` is active for the ambient inputs plus `inputs`.
    pub fn active(&self, name: &str, inputs: &[Input]) -> SwitchResult<bool> {
        self.resolve(name, inputs, false)
    }

    /// Whether switch `name` is active for `inputs` alone.
    pub fn active_exclusive(&self, name: &str, inputs: &[Input]) -> SwitchResult<bool> {
        self.resolve(name, inputs, true)
    }

    fn resolve(&self, name: &str, extra: &[Input], exclusive: bool) -> SwitchResult<bool> {
        let switch = self.switch(name)?;

        let mut inputs = if exclusive { Vec::new() } else { self.inputs() };
        inputs.extend(extra.iter().cloned());
        if inputs.is_empty() {
            inputs.push(NONE_INPUT);
        }

        if switch.consent {
            if let Some(parent) = &switch.parent {
                if !self.active_exclusive(parent, &inputs)? {
                    debug!(switch = name, parent = %parent, "Parent inactive; switch blocked");
                    return Ok(false);
                }
            }
        }

        for input in &inputs {
            if switch.enabled_for(input)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// `"a:b:c"` → `"a:b"`; names without a colon have no implicit parent.
fn implicit_parent(name: &str) -> Option<&str> {
    name.rsplit_once(':')
        .map(|(parent, _)| parent)
        .filter(|parent| !parent.is_empty())
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(MemoryStorage::new().shared())
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("id", &self.shared.id)
            .field("namespace", &self.namespace)
            .field("autocreate", &self.shared.autocreate)
            .finish()
    }
}

/// Builder for [`Manager`].
#[derive(Default)]
pub struct ManagerBuilder {
    storage: Option<SharedStorage>,
    config: ManagerConfig,
}

impl ManagerBuilder {
    pub fn storage(mut self, storage: SharedStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn autocreate(mut self, autocreate: bool) -> Self {
        self.config.autocreate = autocreate;
        self
    }

    pub fn namespace<I, S>(mut self, namespace: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.namespace = namespace.into_iter().map(Into::into).collect();
        self
    }

    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the manager; storage defaults to an empty [`MemoryStorage`].
    pub fn build(self) -> Manager {
        let storage = self
            .storage
            .unwrap_or_else(|| MemoryStorage::new().shared());
        Manager::from_config(storage, &self.config)
    }
}
