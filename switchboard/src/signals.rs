//! Signal bus for switch lifecycle and evaluation events
//!
//! Each [`Signal`] is a list of receivers invoked synchronously, in
//! connection order, whenever the engine emits the matching
//! [`SwitchEvent`]. A [`Signals`] set is owned by a manager and shared by
//! every namespaced view of it, so tests and embedders get isolated
//! subscriptions per manager rather than process-wide globals.
//!
//! Receivers are not fault-isolated: a panicking receiver unwinds through
//! the emitter and skips the receivers connected after it.
//!
//! # Usage
//!
//! ```rust,ignore
//! manager.signals().switch_active.connect(|event| {
//!     if let SwitchEvent::Active { switch, .. } = event {
//!         tracing::info!(switch = switch.name(), "switch active");
//!     }
//! });
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::condition::Condition;
use crate::input::Input;
use crate::operators::ApplyError;
use crate::switch::Switch;

/// An event emitted by the engine.
#[derive(Debug, Clone, Copy)]
pub enum SwitchEvent<'a> {
    Registered(&'a Switch),
    Unregistered(&'a Switch),
    Updated(&'a Switch),
    /// Fired before every evaluation, whatever the outcome.
    Checked(&'a Switch),
    /// Fired only when a switch evaluates true for an input.
    Active {
        switch: &'a Switch,
        input: &'a Input,
    },
    /// An operator failed; the condition evaluated to false.
    ConditionApplyError {
        condition: &'a Condition,
        input: &'a Input,
        error: &'a ApplyError,
    },
}

impl SwitchEvent<'_> {
    /// Get the signal name this event is emitted on
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Registered(_) => "switch_registered",
            Self::Unregistered(_) => "switch_unregistered",
            Self::Updated(_) => "switch_updated",
            Self::Checked(_) => "switch_checked",
            Self::Active { .. } => "switch_active",
            Self::ConditionApplyError { .. } => "condition_apply_error",
        }
    }

    /// The switch involved, if any.
    pub fn switch(&self) -> Option<&Switch> {
        match self {
            Self::Registered(s) | Self::Unregistered(s) | Self::Updated(s) | Self::Checked(s) => {
                Some(*s)
            }
            Self::Active { switch, .. } => Some(*switch),
            Self::ConditionApplyError { .. } => None,
        }
    }
}

/// A signal receiver.
pub type Receiver = Arc<dyn Fn(&SwitchEvent<'_>) + Send + Sync>;

/// A named list of receivers.
pub struct Signal {
    name: &'static str,
    receivers: RwLock<Vec<Receiver>>,
}

impl Signal {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            receivers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a receiver; it runs after every receiver connected before it.
    pub fn connect<F>(&self, receiver: F)
    where
        F: Fn(&SwitchEvent<'_>) + Send + Sync + 'static,
    {
        self.receivers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(receiver));
    }

    /// Invoke every receiver with `event`.
    ///
    /// The receiver list is snapshotted first, so receivers may connect
    /// further receivers without deadlocking; those run from the next call.
    pub fn call(&self, event: &SwitchEvent<'_>) {
        let receivers: Vec<Receiver> = self
            .receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        debug!(
            signal = self.name,
            receivers = receivers.len(),
            "Signal dispatched"
        );

        for receiver in &receivers {
            receiver(event);
        }
    }

    /// Number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every receiver.
    pub fn disconnect_all(&self) {
        self.receivers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name)
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

/// The full set of engine signals.
#[derive(Debug)]
pub struct Signals {
    pub switch_registered: Signal,
    pub switch_unregistered: Signal,
    pub switch_updated: Signal,
    pub switch_checked: Signal,
    pub switch_active: Signal,
    pub condition_apply_error: Signal,
}

impl Signals {
    pub fn new() -> Self {
        Self {
            switch_registered: Signal::new("switch_registered"),
            switch_unregistered: Signal::new("switch_unregistered"),
            switch_updated: Signal::new("switch_updated"),
            switch_checked: Signal::new("switch_checked"),
            switch_active: Signal::new("switch_active"),
            condition_apply_error: Signal::new("condition_apply_error"),
        }
    }

    /// Every signal, in declaration order.
    pub fn all(&self) -> [&Signal; 6] {
        [
            &self.switch_registered,
            &self.switch_unregistered,
            &self.switch_updated,
            &self.switch_checked,
            &self.switch_active,
            &self.condition_apply_error,
        ]
    }

    /// Route `event` to the signal it belongs to.
    pub fn emit(&self, event: SwitchEvent<'_>) {
        let signal = match event {
            SwitchEvent::Registered(_) => &self.switch_registered,
            SwitchEvent::Unregistered(_) => &self.switch_unregistered,
            SwitchEvent::Updated(_) => &self.switch_updated,
            SwitchEvent::Checked(_) => &self.switch_checked,
            SwitchEvent::Active { .. } => &self.switch_active,
            SwitchEvent::ConditionApplyError { .. } => &self.condition_apply_error,
        };
        signal.call(&event);
    }

    /// Connect one receiver to every signal.
    pub fn connect_all<F>(&self, receiver: F)
    where
        F: Fn(&SwitchEvent<'_>) + Send + Sync + 'static,
    {
        let receiver = Arc::new(receiver);
        for signal in self.all() {
            let receiver = Arc::clone(&receiver);
            signal.connect(move |event| receiver(event));
        }
    }

    /// Drop every receiver on every signal.
    pub fn disconnect_all(&self) {
        for signal in self.all() {
            signal.disconnect_all();
        }
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}
