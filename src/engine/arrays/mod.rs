//! Presentation Engine - Parallel Arrays
//!
//! All node state lives in these parallel arrays.
//! Each array index corresponds to one presentation node.
//!
//! Reactive cells (text content, flags) use `TrackedSlotArray` so hosts can
//! observe them from deriveds and effects with per-index tracking. Structural
//! state (tree links, classes, attributes) is plain storage mutated only by
//! the tree operations.
//!
//! # Array Categories
//!
//! - **core**: Tag, tree links, classes, attributes, bindings, flags
//! - **text**: Text content and its write revision
//! - **dirty**: Indices written since the host last drained them

pub mod core;
pub mod dirty;
pub mod text;

use spark_signals::TrackedSlotArray;

use self::core as core_arrays;
use self::text as text_arrays;

/// Reset every slot of a `TrackedSlotArray` to its default.
pub trait ClearAll {
    fn clear_all(&self);
}

impl<T: Clone + PartialEq + 'static> ClearAll for TrackedSlotArray<T> {
    fn clear_all(&self) {
        for i in 0..self.len() {
            self.clear(i);
        }
    }
}

/// Ensure all arrays have capacity for the given index.
///
/// Called by registry when allocating.
pub fn ensure_all_capacity(index: usize) {
    core_arrays::ensure_capacity(index);
    text_arrays::ensure_capacity(index);
}

/// Clear all array values at an index.
///
/// Called by registry when releasing.
pub fn clear_all_at_index(index: usize) {
    core_arrays::clear_at_index(index);
    text_arrays::clear_at_index(index);
}

/// Reset all parallel arrays to release memory.
///
/// Called automatically when every node has been released.
pub fn reset_all_arrays() {
    core_arrays::reset();
    text_arrays::reset();
    dirty::clear_all_dirty_sets();
}
