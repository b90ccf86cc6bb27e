//! Ambient input storage, isolated per execution context.
//!
//! Inputs pushed with [`Manager::input`](crate::Manager::input) are keyed by
//! manager and stored thread-locally, so one thread never observes another
//! thread's inputs. Async code that multiplexes many requests over one
//! worker thread wraps each request in [`scope`], which switches storage to
//! a tokio task-local for the lifetime of that future.
//!
//! Task-local scopes are not inherited by `tokio::spawn`ed tasks; each
//! spawned task that pushes inputs needs its own [`scope`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;

use crate::input::Input;

type InputMap = HashMap<u64, Vec<Input>>;

thread_local! {
    static THREAD_INPUTS: RefCell<InputMap> = RefCell::new(HashMap::new());
}

tokio::task_local! {
    static TASK_INPUTS: RefCell<InputMap>;
}

/// Run `future` with its own, initially empty, ambient input store.
pub async fn scope<F: Future>(future: F) -> F::Output {
    TASK_INPUTS
        .scope(RefCell::new(HashMap::new()), future)
        .await
}

/// Whether the caller is inside a [`scope`].
pub fn in_scope() -> bool {
    TASK_INPUTS.try_with(|_| ()).is_ok()
}

fn with_inputs<R>(f: impl FnOnce(&mut InputMap) -> R) -> R {
    if in_scope() {
        TASK_INPUTS.with(|cell| f(&mut cell.borrow_mut()))
    } else {
        THREAD_INPUTS.with(|cell| f(&mut cell.borrow_mut()))
    }
}

pub(crate) fn set(manager: u64, inputs: Vec<Input>) {
    with_inputs(|map| {
        map.insert(manager, inputs);
    });
}

pub(crate) fn get(manager: u64) -> Vec<Input> {
    with_inputs(|map| map.get(&manager).cloned().unwrap_or_default())
}

pub(crate) fn clear(manager: u64) {
    with_inputs(|map| {
        map.remove(&manager);
    });
}

/// Drop `manager`'s entries from the current task and thread stores.
///
/// Safe to call while thread-locals are being torn down.
pub(crate) fn release(manager: u64) {
    let remove = |cell: &RefCell<InputMap>| {
        if let Ok(mut map) = cell.try_borrow_mut() {
            map.remove(&manager);
        }
    };
    let _ = TASK_INPUTS.try_with(remove);
    let _ = THREAD_INPUTS.try_with(remove);
}
