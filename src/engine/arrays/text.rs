//! Presentation Engine - Text Arrays
//!
//! Text-related properties:
//! - textContent: The text string a node displays
//! - textRevision: How many times textContent has been written
//!
//! Uses `TrackedSlotArray` for stable reactive cells with fine-grained tracking.
//! The revision counter counts writes, not changes: writing the same string
//! twice is two mutations.

use std::cell::RefCell;

use spark_signals::{TrackedSlotArray, tracked_slot_array};

use super::ClearAll;
use super::dirty::TEXT_DIRTY_SET;

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    /// Text content string.
    static TEXT_CONTENT: TrackedSlotArray<String> =
        tracked_slot_array(Some(String::new()), TEXT_DIRTY_SET.with(|s| s.clone()));

    /// Write counter per node.
    static TEXT_REVISION: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

// =============================================================================
// Capacity Management
// =============================================================================

/// Ensure arrays have capacity for the given index.
pub fn ensure_capacity(index: usize) {
    TEXT_CONTENT.with(|arr| { let _ = arr.peek(index); });
    TEXT_REVISION.with(|arr| {
        let mut arr = arr.borrow_mut();
        if arr.len() <= index {
            arr.resize(index + 1, 0);
        }
    });
}

/// Clear values at index.
pub fn clear_at_index(index: usize) {
    TEXT_CONTENT.with(|arr| arr.clear(index));
    TEXT_REVISION.with(|arr| {
        if let Some(rev) = arr.borrow_mut().get_mut(index) {
            *rev = 0;
        }
    });
}

/// Reset all arrays.
pub fn reset() {
    TEXT_CONTENT.with(|arr| arr.clear_all());
    TEXT_REVISION.with(|arr| arr.borrow_mut().clear());
}

// =============================================================================
// Text Content
// =============================================================================

/// Get text content at index (reactive).
pub fn get_text_content(index: usize) -> String {
    TEXT_CONTENT.with(|arr| arr.get(index)).unwrap_or_default()
}

/// Set text content at index. Always counts as one mutation.
pub fn set_text_content(index: usize, content: String) {
    TEXT_CONTENT.with(|arr| arr.set_value(index, content));
    TEXT_REVISION.with(|arr| {
        let mut arr = arr.borrow_mut();
        if arr.len() <= index {
            arr.resize(index + 1, 0);
        }
        arr[index] += 1;
    });
}

/// Number of text writes since the node was allocated.
pub fn get_text_revision(index: usize) -> u64 {
    TEXT_REVISION.with(|arr| arr.borrow().get(index).copied().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        reset();
    }

    #[test]
    fn test_text_content() {
        setup();
        ensure_capacity(0);

        assert_eq!(get_text_content(0), "");
        set_text_content(0, "hello".to_string());
        assert_eq!(get_text_content(0), "hello");
    }

    #[test]
    fn test_revision_counts_every_write() {
        setup();
        ensure_capacity(3);

        set_text_content(3, "a".to_string());
        set_text_content(3, "a".to_string());
        assert_eq!(get_text_revision(3), 2);

        clear_at_index(3);
        assert_eq!(get_text_revision(3), 0);
        assert_eq!(get_text_content(3), "");
    }
}
