//! Presentation Engine - Core Arrays
//!
//! Structural node properties:
//! - tag: Element kind (`div`, `time`, `input`, ...)
//! - parent / children: Tree links, children kept in presentation order
//! - classes / attributes: Styling hooks read by the host
//! - binding: Which entity field (if any) this node mirrors
//! - flags: Container / insert-mode / disabled bits (reactive)

use std::cell::RefCell;
use std::collections::BTreeMap;

use spark_signals::{TrackedSlotArray, tracked_slot_array};

use super::ClearAll;
use super::dirty::CORE_DIRTY_SET;

use crate::types::{Binding, NodeFlags};

// =============================================================================
// Arrays
// =============================================================================

thread_local! {
    /// Element tag.
    static TAG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };

    /// Parent index (None = detached or root).
    static PARENT: RefCell<Vec<Option<usize>>> = const { RefCell::new(Vec::new()) };

    /// Children in presentation order.
    static CHILDREN: RefCell<Vec<Vec<usize>>> = const { RefCell::new(Vec::new()) };

    /// Class list (insertion ordered, no duplicates).
    static CLASSES: RefCell<Vec<Vec<String>>> = const { RefCell::new(Vec::new()) };

    /// Attributes.
    static ATTRIBUTES: RefCell<Vec<BTreeMap<String, String>>> = const { RefCell::new(Vec::new()) };

    /// Field binding marker.
    static BINDING: RefCell<Vec<Option<Binding>>> = const { RefCell::new(Vec::new()) };

    /// Node flags.
    static FLAGS: TrackedSlotArray<NodeFlags> =
        tracked_slot_array(Some(NodeFlags::NONE), CORE_DIRTY_SET.with(|s| s.clone()));
}

fn grow<T: Default>(vec: &mut Vec<T>, index: usize) {
    if vec.len() <= index {
        vec.resize_with(index + 1, T::default);
    }
}

// =============================================================================
// Capacity Management
// =============================================================================

/// Ensure arrays have capacity for the given index.
pub fn ensure_capacity(index: usize) {
    TAG.with(|arr| grow(&mut arr.borrow_mut(), index));
    PARENT.with(|arr| grow(&mut arr.borrow_mut(), index));
    CHILDREN.with(|arr| grow(&mut arr.borrow_mut(), index));
    CLASSES.with(|arr| grow(&mut arr.borrow_mut(), index));
    ATTRIBUTES.with(|arr| grow(&mut arr.borrow_mut(), index));
    BINDING.with(|arr| grow(&mut arr.borrow_mut(), index));
    FLAGS.with(|arr| { let _ = arr.peek(index); });
}

/// Clear values at index.
pub fn clear_at_index(index: usize) {
    TAG.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            slot.clear();
        }
    });
    PARENT.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = None;
        }
    });
    CHILDREN.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            slot.clear();
        }
    });
    CLASSES.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            slot.clear();
        }
    });
    ATTRIBUTES.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            slot.clear();
        }
    });
    BINDING.with(|arr| {
        if let Some(slot) = arr.borrow_mut().get_mut(index) {
            *slot = None;
        }
    });
    FLAGS.with(|arr| arr.clear(index));
}

/// Reset all arrays.
pub fn reset() {
    TAG.with(|arr| arr.borrow_mut().clear());
    PARENT.with(|arr| arr.borrow_mut().clear());
    CHILDREN.with(|arr| arr.borrow_mut().clear());
    CLASSES.with(|arr| arr.borrow_mut().clear());
    ATTRIBUTES.with(|arr| arr.borrow_mut().clear());
    BINDING.with(|arr| arr.borrow_mut().clear());
    FLAGS.with(|arr| arr.clear_all());
}

// =============================================================================
// Tag
// =============================================================================

pub fn get_tag(index: usize) -> String {
    TAG.with(|arr| arr.borrow().get(index).cloned().unwrap_or_default())
}

pub fn set_tag(index: usize, tag: &str) {
    TAG.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        arr[index] = tag.to_string();
    });
}

// =============================================================================
// Tree Links
// =============================================================================

/// Get parent index.
pub fn get_parent_index(index: usize) -> Option<usize> {
    PARENT.with(|arr| arr.borrow().get(index).copied().flatten())
}

/// Set parent index. Does not touch the parent's child list.
pub fn set_parent_index(index: usize, parent: Option<usize>) {
    PARENT.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        arr[index] = parent;
    });
}

/// Children of `index`, in presentation order.
pub fn get_children(index: usize) -> Vec<usize> {
    CHILDREN.with(|arr| arr.borrow().get(index).cloned().unwrap_or_default())
}

pub fn get_child_count(index: usize) -> usize {
    CHILDREN.with(|arr| arr.borrow().get(index).map_or(0, Vec::len))
}

/// Insert `child` into `index`'s child list at `position` (clamped).
pub fn insert_child_at(index: usize, position: usize, child: usize) {
    CHILDREN.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        let children = &mut arr[index];
        let position = position.min(children.len());
        children.insert(position, child);
    });
}

/// Remove `child` from `index`'s child list. Returns true if it was present.
pub fn remove_child(index: usize, child: usize) -> bool {
    CHILDREN.with(|arr| {
        let mut arr = arr.borrow_mut();
        let Some(children) = arr.get_mut(index) else {
            return false;
        };
        match children.iter().position(|&c| c == child) {
            Some(position) => {
                children.remove(position);
                true
            }
            None => false,
        }
    })
}

// =============================================================================
// Classes
// =============================================================================

pub fn get_classes(index: usize) -> Vec<String> {
    CLASSES.with(|arr| arr.borrow().get(index).cloned().unwrap_or_default())
}

pub fn has_class(index: usize, class: &str) -> bool {
    CLASSES.with(|arr| {
        arr.borrow()
            .get(index)
            .is_some_and(|classes| classes.iter().any(|c| c == class))
    })
}

pub fn add_class(index: usize, class: &str) {
    CLASSES.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        let classes = &mut arr[index];
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    });
}

pub fn remove_class(index: usize, class: &str) {
    CLASSES.with(|arr| {
        if let Some(classes) = arr.borrow_mut().get_mut(index) {
            classes.retain(|c| c != class);
        }
    });
}

// =============================================================================
// Attributes
// =============================================================================

pub fn get_attribute(index: usize, name: &str) -> Option<String> {
    ATTRIBUTES.with(|arr| {
        arr.borrow()
            .get(index)
            .and_then(|attrs| attrs.get(name).cloned())
    })
}

pub fn set_attribute(index: usize, name: &str, value: &str) {
    ATTRIBUTES.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        arr[index].insert(name.to_string(), value.to_string());
    });
}

pub fn remove_attribute(index: usize, name: &str) -> Option<String> {
    ATTRIBUTES.with(|arr| {
        arr.borrow_mut()
            .get_mut(index)
            .and_then(|attrs| attrs.remove(name))
    })
}

// =============================================================================
// Binding
// =============================================================================

pub fn get_binding(index: usize) -> Option<Binding> {
    BINDING.with(|arr| arr.borrow().get(index).cloned().flatten())
}

pub fn set_binding(index: usize, binding: Option<Binding>) {
    BINDING.with(|arr| {
        let mut arr = arr.borrow_mut();
        grow(&mut arr, index);
        arr[index] = binding;
    });
}

// =============================================================================
// Flags
// =============================================================================

/// Get node flags (reactive).
pub fn get_flags(index: usize) -> NodeFlags {
    FLAGS.with(|arr| arr.get(index)).unwrap_or_default()
}

pub fn set_flags(index: usize, flags: NodeFlags) {
    FLAGS.with(|arr| arr.set_value(index, flags));
}

/// Set or clear the given flag bits, leaving the rest untouched.
pub fn toggle_flags(index: usize, bits: NodeFlags, on: bool) {
    let mut flags = get_flags(index);
    flags.set(bits, on);
    set_flags(index, flags);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() {
        reset();
    }

    #[test]
    fn test_children_order() {
        setup();

        insert_child_at(0, 0, 1);
        insert_child_at(0, 1, 2);
        insert_child_at(0, 0, 3);
        assert_eq!(get_children(0), vec![3, 1, 2]);

        assert!(remove_child(0, 1));
        assert!(!remove_child(0, 1));
        assert_eq!(get_children(0), vec![3, 2]);
        assert_eq!(get_child_count(0), 2);
    }

    #[test]
    fn test_insert_position_is_clamped() {
        setup();

        insert_child_at(4, 99, 5);
        assert_eq!(get_children(4), vec![5]);
    }

    #[test]
    fn test_classes_no_duplicates() {
        setup();

        add_class(0, "chat");
        add_class(0, "chat");
        add_class(0, "chat-start");
        assert_eq!(get_classes(0), vec!["chat", "chat-start"]);

        remove_class(0, "chat");
        assert!(!has_class(0, "chat"));
        assert!(has_class(0, "chat-start"));
    }

    #[test]
    fn test_attributes() {
        setup();

        set_attribute(2, "datetime", "100");
        assert_eq!(get_attribute(2, "datetime").as_deref(), Some("100"));
        assert_eq!(remove_attribute(2, "datetime").as_deref(), Some("100"));
        assert_eq!(get_attribute(2, "datetime"), None);
    }

    #[test]
    fn test_flags_toggle() {
        setup();
        ensure_capacity(0);

        toggle_flags(0, NodeFlags::CONTAINER, true);
        toggle_flags(0, NodeFlags::FRONT_INSERT, true);
        toggle_flags(0, NodeFlags::CONTAINER, false);
        assert_eq!(get_flags(0), NodeFlags::FRONT_INSERT);
    }

    #[test]
    fn test_clear_at_index() {
        setup();

        set_tag(1, "div");
        add_class(1, "x");
        set_parent_index(1, Some(0));
        set_binding(1, Some(Binding::Display("msg".into())));
        clear_at_index(1);

        assert_eq!(get_tag(1), "");
        assert!(get_classes(1).is_empty());
        assert_eq!(get_parent_index(1), None);
        assert_eq!(get_binding(1), None);
    }
}
