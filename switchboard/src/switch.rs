//! Switches: named feature flags with a state, conditions and a parent.
//!
//! # States
//!
//! ```text
//! Disabled (1) ⇄ Selective (2) ⇄ Global (3)
//! ```
//!
//! Any state may be assigned directly; there is no guarded transition
//! graph. `Selective` switches consult their conditions, combined with
//! `all` when compounded and `any` otherwise.
//!
//! # Change tracking
//!
//! A switch snapshots its own fields when built and on every
//! [`Switch::reset`]. [`Switch::changed`] and [`Switch::changes`] compare
//! the live fields against that snapshot, which is what `save()` clears.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::condition::Condition;
use crate::error::SwitchResult;
use crate::input::Input;
use crate::manager::Manager;
use crate::signals::{Signals, SwitchEvent};

/// Activation state of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SwitchState {
    /// Off for every input.
    #[default]
    Disabled = 1,
    /// On for inputs matching its conditions.
    Selective = 2,
    /// On for every input.
    Global = 3,
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Selective => write!(f, "selective"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// One field that differs from the last snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub previous: serde_json::Value,
    pub current: serde_json::Value,
}

type Snapshot = BTreeMap<&'static str, serde_json::Value>;

/// A named feature flag.
#[derive(Clone)]
pub struct Switch {
    name: String,
    pub label: Option<String>,
    pub description: Option<String>,
    pub state: SwitchState,
    /// Require every condition instead of any one.
    pub compounded: bool,
    pub parent: Option<String>,
    /// Defer to the parent's activation before evaluating this switch.
    pub consent: bool,
    /// Child switch names, maintained by the manager.
    pub children: Vec<String>,
    pub conditions: Vec<Condition>,
    manager: Option<Manager>,
    snapshot: Snapshot,
}

impl Switch {
    /// Create a disabled switch with no conditions.
    pub fn new(name: impl Into<String>) -> Self {
        let mut switch = Self {
            name: name.into(),
            label: None,
            description: None,
            state: SwitchState::Disabled,
            compounded: false,
            parent: None,
            consent: true,
            children: Vec::new(),
            conditions: Vec::new(),
            manager: None,
            snapshot: Snapshot::new(),
        };
        switch.reset();
        switch
    }

    pub fn with_state(mut self, state: SwitchState) -> Self {
        self.state = state;
        self.reset();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self.reset();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self.reset();
        self
    }

    pub fn with_compounded(mut self, compounded: bool) -> Self {
        self.compounded = compounded;
        self.reset();
        self
    }

    pub fn with_consent(mut self, consent: bool) -> Self {
        self.consent = consent;
        self.reset();
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self.reset();
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self.reset();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning manager, if this switch was registered or fetched through one.
    pub fn manager(&self) -> Option<&Manager> {
        self.manager.as_ref()
    }

    pub(crate) fn attach(&mut self, manager: Manager) {
        self.manager = Some(manager);
    }

    /// Copy suitable for storage: no manager and a clean snapshot.
    pub(crate) fn detached(&self) -> Self {
        let mut copy = self.clone();
        copy.manager = None;
        copy.reset();
        copy
    }

    /// Evaluate this switch for one input.
    ///
    /// Signals go to the owning manager; a detached switch emits into a
    /// throwaway signal set.
    pub fn enabled_for(&self, input: &Input) -> SwitchResult<bool> {
        match &self.manager {
            Some(manager) => self.evaluate(input, manager.signals()),
            None => self.evaluate(input, &Signals::default()),
        }
    }

    pub(crate) fn evaluate(&self, input: &Input, signals: &Signals) -> SwitchResult<bool> {
        signals.emit(SwitchEvent::Checked(self));

        let result = match self.state {
            SwitchState::Global => true,
            SwitchState::Disabled => false,
            SwitchState::Selective if self.compounded => {
                let mut all = true;
                for condition in &self.conditions {
                    if !condition.call(input, signals)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            SwitchState::Selective => {
                let mut any = false;
                for condition in &self.conditions {
                    if condition.call(input, signals)? {
                        any = true;
                        break;
                    }
                }
                any
            }
        };

        if result {
            signals.emit(SwitchEvent::Active {
                switch: self,
                input,
            });
        }
        Ok(result)
    }

    /// Persist through the owning manager and clear the change set.
    ///
    /// Without a manager this does nothing.
    pub fn save(&mut self) -> SwitchResult<()> {
        match self.manager.clone() {
            Some(manager) => manager.update(self),
            None => {
                warn!(switch = %self.name, "save() called on a switch with no manager; nothing persisted");
                Ok(())
            }
        }
    }

    /// Take a new snapshot of the current field values.
    pub fn reset(&mut self) {
        self.snapshot = self.fields();
    }

    /// Whether any field differs from the snapshot.
    pub fn changed(&self) -> bool {
        self.fields() != self.snapshot
    }

    /// Fields that differ from the snapshot, with both values.
    pub fn changes(&self) -> BTreeMap<&'static str, Change> {
        self.fields()
            .into_iter()
            .filter_map(|(field, current)| {
                let previous = self
                    .snapshot
                    .get(field)
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                (previous != current).then_some((field, Change { previous, current }))
            })
            .collect()
    }

    fn fields(&self) -> Snapshot {
        Snapshot::from([
            ("label", json!(self.label)),
            ("description", json!(self.description)),
            ("state", json!(self.state)),
            ("compounded", json!(self.compounded)),
            ("parent", json!(self.parent)),
            ("consent", json!(self.consent)),
            ("children", json!(self.children)),
            (
                "conditions",
                serde_json::Value::Array(self.conditions.iter().map(Condition::to_json).collect()),
            ),
        ])
    }

    /// JSON view of the switch, as listed by the CLI.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::Map::new();
        value.insert("name".to_string(), json!(self.name));
        for (field, current) in self.fields() {
            value.insert(field.to_string(), current);
        }
        serde_json::Value::Object(value)
    }
}

/// Switches compare by name, state, compounding and consent; the owning
/// manager never takes part.
impl PartialEq for Switch {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.state == other.state
            && self.compounded == other.compounded
            && self.consent == other.consent
    }
}

impl AsRef<str> for Switch {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({}) [{}]", self.name, label, self.state),
            None => write!(f, "{} [{}]", self.name, self.state),
        }
    }
}

impl fmt::Debug for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Switch")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("compounded", &self.compounded)
            .field("parent", &self.parent)
            .field("consent", &self.consent)
            .field("children", &self.children)
            .field("conditions", &self.conditions)
            .field("managed", &self.manager.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{Arguments, SharedArgument};
    use crate::operators::{Equals, MoreThanOrEqualTo};
    use std::sync::{Arc, Mutex};

    struct User {
        age: i64,
    }

    fn user(age: i64) -> Input {
        Input::new(User { age })
    }

    fn user_args() -> SharedArgument {
        Arguments::<User>::new("User").integer("age", |u| u.age).shared()
    }

    fn adult() -> Condition {
        Condition::new(user_args(), "age", MoreThanOrEqualTo::new(21))
    }

    fn exactly(age: i64) -> Condition {
        Condition::new(user_args(), "age", Equals::new(age))
    }

    #[test]
    fn test_new_switch_defaults() {
        let switch = Switch::new("beta");
        assert_eq!(switch.name(), "beta");
        assert_eq!(switch.state, SwitchState::Disabled);
        assert!(!switch.compounded);
        assert!(switch.consent);
        assert!(switch.parent.is_none());
        assert!(switch.children.is_empty());
        assert!(!switch.changed());
    }

    #[test]
    fn test_states_are_distinct() {
        assert_eq!(SwitchState::Disabled as u8, 1);
        assert_eq!(SwitchState::Selective as u8, 2);
        assert_eq!(SwitchState::Global as u8, 3);
        assert_ne!(SwitchState::Disabled, SwitchState::Selective);
        assert_ne!(SwitchState::Selective, SwitchState::Global);
    }

    #[test]
    fn test_global_and_disabled_ignore_conditions() {
        let global = Switch::new("g")
            .with_state(SwitchState::Global)
            .with_condition(adult());
        let disabled = Switch::new("d").with_condition(adult());
        for input in [user(5), user(50), Input::NONE] {
            assert!(global.enabled_for(&input).unwrap());
            assert!(!disabled.enabled_for(&input).unwrap());
        }
    }

    #[test]
    fn test_selective_with_condition() {
        let switch = Switch::new("beta")
            .with_state(SwitchState::Selective)
            .with_condition(adult());
        assert!(switch.enabled_for(&user(25)).unwrap());
        assert!(!switch.enabled_for(&user(18)).unwrap());
    }

    #[test]
    fn test_empty_conditions() {
        let any = Switch::new("any").with_state(SwitchState::Selective);
        let all = Switch::new("all")
            .with_state(SwitchState::Selective)
            .with_compounded(true);
        assert!(!any.enabled_for(&user(30)).unwrap());
        assert!(all.enabled_for(&user(30)).unwrap());
        assert!(all.enabled_for(&Input::NONE).unwrap());
    }

    #[test]
    fn test_compounded_requires_every_condition() {
        let conditions = [adult(), exactly(30)];
        let any = Switch::new("any")
            .with_state(SwitchState::Selective)
            .with_conditions(conditions.clone());
        let all = any.clone().with_compounded(true);

        assert!(any.enabled_for(&user(25)).unwrap());
        assert!(!all.enabled_for(&user(25)).unwrap());
        assert!(all.enabled_for(&user(30)).unwrap());
    }

    #[test]
    fn test_signals_fire_checked_then_active() {
        let signals = Signals::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        {
            let events = Arc::clone(&events);
            signals.connect_all(move |e| events.lock().unwrap().push(e.event_type()));
        }
        let switch = Switch::new("beta")
            .with_state(SwitchState::Selective)
            .with_condition(adult());

        assert!(!switch.evaluate(&user(10), &signals).unwrap());
        assert_eq!(*events.lock().unwrap(), vec!["switch_checked"]);

        events.lock().unwrap().clear();
        assert!(switch.evaluate(&user(40), &signals).unwrap());
        assert_eq!(
            *events.lock().unwrap(),
            vec!["switch_checked", "switch_active"]
        );
    }

    #[test]
    fn test_change_tracking() {
        let mut switch = Switch::new("beta").with_label("Beta");
        assert!(!switch.changed());

        switch.state = SwitchState::Global;
        switch.description = Some("rollout".to_string());
        assert!(switch.changed());

        let changes = switch.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes["state"],
            Change {
                previous: json!("disabled"),
                current: json!("global"),
            }
        );
        assert_eq!(changes["description"].previous, serde_json::Value::Null);

        switch.reset();
        assert!(!switch.changed());
        assert!(switch.changes().is_empty());
    }

    #[test]
    fn test_conditions_are_tracked() {
        let mut switch = Switch::new("beta");
        switch.conditions.push(adult());
        assert_eq!(switch.changes().keys().copied().collect::<Vec<_>>(), vec!["conditions"]);
    }

    #[test]
    fn test_equality_ignores_metadata() {
        let a = Switch::new("beta").with_state(SwitchState::Global);
        let b = Switch::new("beta")
            .with_state(SwitchState::Global)
            .with_label("other label")
            .with_condition(adult());
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_compounded(true));
        assert_ne!(a, Switch::new("gamma").with_state(SwitchState::Global));
    }

    #[test]
    fn test_save_without_manager_is_noop() {
        let mut switch = Switch::new("loose");
        switch.state = SwitchState::Global;
        switch.save().unwrap();
        // Nothing persisted, so the change set survives.
        assert!(switch.changed());
    }

    #[test]
    fn test_display() {
        assert_eq!(Switch::new("beta").to_string(), "beta [disabled]");
        assert_eq!(
            Switch::new("beta")
                .with_label("Beta")
                .with_state(SwitchState::Selective)
                .to_string(),
            "beta (Beta) [selective]"
        );
    }
}
