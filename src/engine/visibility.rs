//! Visibility - Intersection observation for presentation nodes.
//!
//! The host (renderer, scroll container, test) reports whether a node
//! intersects its viewport with [`report_intersection`]. Observers registered
//! with [`observe`] are notified only when that state changes; the first
//! report for a node always counts as a change.
//!
//! Observation ends three ways:
//! - [`unobserve`] with the handle returned by [`observe`]
//! - [`retire`], called by the tree when a node is detached or released
//! - [`reset`] (tests)

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Visibility callback. Receives `true` when the node became visible.
pub type VisibilityCallback = Rc<dyn Fn(bool)>;

/// Handle for one registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

// =============================================================================
// State
// =============================================================================

thread_local! {
    /// Observers per node index.
    static OBSERVERS: RefCell<HashMap<usize, Vec<(ObserverId, VisibilityCallback)>>> =
        RefCell::new(HashMap::new());

    /// Last reported intersection state per node index.
    static LAST_STATE: RefCell<HashMap<usize, bool>> = RefCell::new(HashMap::new());

    /// Observer id counter.
    static NEXT_OBSERVER: Cell<u64> = const { Cell::new(0) };
}

// =============================================================================
// Public API
// =============================================================================

/// Start observing `index`.
pub fn observe(index: usize, callback: impl Fn(bool) + 'static) -> ObserverId {
    let id = NEXT_OBSERVER.with(|next| {
        let id = next.get();
        next.set(id + 1);
        ObserverId(id)
    });
    OBSERVERS.with(|observers| {
        observers
            .borrow_mut()
            .entry(index)
            .or_default()
            .push((id, Rc::new(callback)));
    });
    id
}

/// Stop one observer. Returns true if it was registered.
pub fn unobserve(index: usize, id: ObserverId) -> bool {
    OBSERVERS.with(|observers| {
        let mut observers = observers.borrow_mut();
        let Some(list) = observers.get_mut(&index) else {
            return false;
        };
        let before = list.len();
        list.retain(|(observer, _)| *observer != id);
        let removed = list.len() != before;
        if list.is_empty() {
            observers.remove(&index);
        }
        removed
    })
}

/// Whether a specific observer is still registered on `index`.
pub fn is_observing(index: usize, id: ObserverId) -> bool {
    OBSERVERS.with(|observers| {
        observers
            .borrow()
            .get(&index)
            .is_some_and(|list| list.iter().any(|(observer, _)| *observer == id))
    })
}

/// Whether anything observes `index`.
pub fn is_observed(index: usize) -> bool {
    OBSERVERS.with(|observers| observers.borrow().contains_key(&index))
}

/// Drop every observer and the remembered state of `index`.
pub fn retire(index: usize) {
    OBSERVERS.with(|observers| {
        observers.borrow_mut().remove(&index);
    });
    LAST_STATE.with(|state| {
        state.borrow_mut().remove(&index);
    });
}

/// Last reported state, if any.
pub fn last_reported(index: usize) -> Option<bool> {
    LAST_STATE.with(|state| state.borrow().get(&index).copied())
}

/// Report the intersection state of `index`.
///
/// Returns the number of observers notified (zero when the state did not
/// change). Callbacks run after internal borrows are released, so they may
/// observe or unobserve freely.
pub fn report_intersection(index: usize, visible: bool) -> usize {
    let previous = LAST_STATE.with(|state| state.borrow_mut().insert(index, visible));
    if previous == Some(visible) {
        return 0;
    }

    let callbacks: Vec<VisibilityCallback> = OBSERVERS.with(|observers| {
        observers
            .borrow()
            .get(&index)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    });

    for callback in &callbacks {
        callback(visible);
    }
    callbacks.len()
}

/// Reset all observation state (for testing).
pub fn reset() {
    OBSERVERS.with(|observers| observers.borrow_mut().clear());
    LAST_STATE.with(|state| state.borrow_mut().clear());
    NEXT_OBSERVER.with(|next| next.set(0));
}
