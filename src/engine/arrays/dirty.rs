//! Dirty Sets for Node Arrays
//!
//! Every `TrackedSlotArray` write records its index here, so a host can
//! repaint only the nodes that changed since it last drained the set.

use spark_signals::{DirtySet, dirty_set};

thread_local! {
    /// Dirty set for core arrays (flags).
    pub static CORE_DIRTY_SET: DirtySet = dirty_set();

    /// Dirty set for text arrays (content).
    pub static TEXT_DIRTY_SET: DirtySet = dirty_set();
}

/// Get the core dirty set.
pub fn get_core_dirty_set() -> DirtySet {
    CORE_DIRTY_SET.with(|s| s.clone())
}

/// Get the text dirty set.
pub fn get_text_dirty_set() -> DirtySet {
    TEXT_DIRTY_SET.with(|s| s.clone())
}

/// Drain the text dirty set, returning the touched indices in ascending order.
pub fn take_text_dirty() -> Vec<usize> {
    let mut indices: Vec<usize> = TEXT_DIRTY_SET.with(|s| s.borrow_mut().drain().collect());
    indices.sort_unstable();
    indices
}

/// Clear all dirty sets.
pub fn clear_all_dirty_sets() {
    CORE_DIRTY_SET.with(|s| s.borrow_mut().clear());
    TEXT_DIRTY_SET.with(|s| s.borrow_mut().clear());
}
