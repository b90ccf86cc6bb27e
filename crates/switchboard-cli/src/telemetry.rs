//! Logging setup and the signal-to-tracing bridge.
//!
//! Logs go to stderr so stdout carries only command output.

use switchboard::{Signals, SwitchEvent};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Emit a tracing event for every engine signal.
pub fn bridge_signals(signals: &Signals) {
    signals.connect_all(log_event);
}

fn log_event(event: &SwitchEvent<'_>) {
    match event {
        SwitchEvent::Active { switch, input } => {
            info!(switch = switch.name(), input = ?input, "Switch active");
        }
        SwitchEvent::ConditionApplyError {
            condition,
            input,
            error,
        } => {
            warn!(condition = %condition, input = ?input, error = %error, "Condition failed to apply");
        }
        other => {
            if let Some(switch) = other.switch() {
                debug!(signal = other.event_type(), switch = switch.name(), state = %switch.state, "Switch event");
            }
        }
    }
}
