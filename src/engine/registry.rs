//! Node Registry - Index allocation for parallel arrays.
//!
//! Manages the lifecycle of presentation node indices:
//! - Free index pool for O(1) reuse
//! - ReactiveSet for allocated indices (deriveds react to add/remove)
//! - Destroy callbacks per index
//! - Reset-on-zero: when the last node is released, all arrays are dropped

use std::cell::RefCell;
use std::collections::HashMap;

use spark_signals::ReactiveSet;

use super::{arrays, tree, visibility};

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Set of currently allocated indices (for iteration).
    /// Using ReactiveSet so deriveds that iterate over this set
    /// automatically react when nodes are added or removed.
    static ALLOCATED_INDICES: RefCell<ReactiveSet<usize>> = RefCell::new(ReactiveSet::new());

    /// Pool of freed indices for reuse.
    static FREE_INDICES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };

    /// Next index to allocate if pool is empty.
    static NEXT_INDEX: RefCell<usize> = const { RefCell::new(0) };

    /// Destroy callbacks registered per index.
    static DESTROY_CALLBACKS: RefCell<HashMap<usize, Vec<Box<dyn FnOnce()>>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Index Allocation
// =============================================================================

/// Allocate an index for a new node.
pub fn allocate_index() -> usize {
    // Reuse free index or allocate new
    let index = FREE_INDICES.with(|free| {
        let mut free = free.borrow_mut();
        if let Some(index) = free.pop() {
            index
        } else {
            NEXT_INDEX.with(|next| {
                let mut next = next.borrow_mut();
                let index = *next;
                *next += 1;
                index
            })
        }
    });

    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().insert(index);
    });

    // Ensure arrays have capacity for this index
    arrays::ensure_all_capacity(index);

    index
}

/// Release an index back to the pool.
///
/// Detaches the node from its parent and recursively releases all children.
/// Releasing an index that is not allocated is a no-op.
pub fn release_index(index: usize) {
    if !is_allocated(index) {
        return;
    }

    tree::detach(index);

    // Children first; collect to avoid modifying while iterating
    for child_index in arrays::core::get_children(index) {
        release_index(child_index);
    }

    // Run destroy callbacks before cleanup
    run_destroy_callbacks(index);

    visibility::retire(index);

    ALLOCATED_INDICES.with(|set| {
        set.borrow_mut().remove(&index);
    });

    // Clear all array values at this index
    arrays::clear_all_at_index(index);

    // Return to pool for reuse
    FREE_INDICES.with(|free| {
        free.borrow_mut().push(index);
    });

    // AUTO-CLEANUP: When all nodes are released, reset all arrays to free memory
    let is_empty = ALLOCATED_INDICES.with(|set| set.borrow().is_empty());
    if is_empty {
        arrays::reset_all_arrays();
        FREE_INDICES.with(|free| {
            free.borrow_mut().clear();
        });
        NEXT_INDEX.with(|next| {
            *next.borrow_mut() = 0;
        });
    }
}

// =============================================================================
// Destroy Callbacks
// =============================================================================

/// Register a callback to run when the node at `index` is released.
pub fn on_destroy(index: usize, callback: impl FnOnce() + 'static) {
    DESTROY_CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .entry(index)
            .or_default()
            .push(Box::new(callback));
    });
}

/// Run and clear destroy callbacks for an index.
fn run_destroy_callbacks(index: usize) {
    let callbacks = DESTROY_CALLBACKS.with(|callbacks| {
        callbacks.borrow_mut().remove(&index)
    });
    if let Some(callbacks) = callbacks {
        for callback in callbacks {
            callback();
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

/// Check if an index is currently allocated.
pub fn is_allocated(index: usize) -> bool {
    ALLOCATED_INDICES.with(|set| set.borrow().contains(&index))
}

/// Get the count of currently allocated nodes.
pub fn get_allocated_count() -> usize {
    ALLOCATED_INDICES.with(|set| set.borrow().len())
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Reset all registry state (for testing).
pub fn reset_registry() {
    ALLOCATED_INDICES.with(|set| set.borrow_mut().clear());
    FREE_INDICES.with(|free| free.borrow_mut().clear());
    NEXT_INDEX.with(|next| *next.borrow_mut() = 0);
    DESTROY_CALLBACKS.with(|callbacks| callbacks.borrow_mut().clear());
    visibility::reset();
    arrays::reset_all_arrays();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_index() {
        reset_registry();

        let idx1 = allocate_index();
        let idx2 = allocate_index();
        let idx3 = allocate_index();

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(idx3, 2);

        assert!(is_allocated(0));
        assert!(is_allocated(1));
        assert!(is_allocated(2));
        assert!(!is_allocated(3));

        assert_eq!(get_allocated_count(), 3);
    }

    #[test]
    fn test_release_and_reuse() {
        reset_registry();

        let idx1 = allocate_index();
        let idx2 = allocate_index();

        release_index(idx1);
        assert!(!is_allocated(idx1));
        assert!(is_allocated(idx2));

        // Should reuse the freed index
        let idx3 = allocate_index();
        assert_eq!(idx3, idx1);
    }

    #[test]
    fn test_release_is_recursive_and_detaches() {
        reset_registry();

        let root = allocate_index();
        let parent = allocate_index();
        let child = allocate_index();
        tree::append_child(root, parent);
        tree::append_child(parent, child);

        release_index(parent);

        assert!(!is_allocated(parent));
        assert!(!is_allocated(child));
        assert!(tree::children(root).is_empty());
        assert_eq!(get_allocated_count(), 1);
    }

    #[test]
    fn test_release_twice_is_noop() {
        reset_registry();

        let keep = allocate_index();
        let idx = allocate_index();
        release_index(idx);
        release_index(idx);

        assert_eq!(get_allocated_count(), 1);
        assert_eq!(allocate_index(), idx);
        assert!(is_allocated(keep));
    }

    #[test]
    fn test_destroy_callback() {
        use std::cell::Cell;
        use std::rc::Rc;

        reset_registry();

        let called = Rc::new(Cell::new(false));
        let called_clone = called.clone();

        let idx = allocate_index();
        on_destroy(idx, move || {
            called_clone.set(true);
        });

        assert!(!called.get());
        release_index(idx);
        assert!(called.get());
    }

    #[test]
    fn test_reset_on_zero() {
        reset_registry();

        let a = allocate_index();
        let b = allocate_index();
        release_index(a);
        release_index(b);

        assert_eq!(get_allocated_count(), 0);
        // Pool and counter reset, so allocation starts over
        assert_eq!(allocate_index(), 0);
    }
}
