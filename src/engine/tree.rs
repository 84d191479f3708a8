//! Tree Operations - Attach, detach and query presentation nodes.
//!
//! Nodes form a forest over the parallel arrays. Every mutation here keeps
//! the parent link and the parent's child list consistent: a node is either
//! detached (no parent) or appears exactly once in its parent's children.
//!
//! Detaching a node retires any visibility observation on it and its
//! descendants, so nothing keeps observing a node that left the tree.

use crate::types::{Binding, InsertMode, NodeFlags};

use super::arrays::{core, text};
use super::visibility;

// =============================================================================
// Attach / Detach
// =============================================================================

/// Attach `child` as the last child of `parent`.
pub fn append_child(parent: usize, child: usize) {
    let position = core::get_child_count(parent);
    attach_at(parent, child, position);
}

/// Attach `child` as the first child of `parent`.
pub fn prepend_child(parent: usize, child: usize) {
    attach_at(parent, child, 0);
}

/// Attach `child` according to `mode`.
pub fn insert_child(parent: usize, child: usize, mode: InsertMode) {
    match mode {
        InsertMode::Back => append_child(parent, child),
        InsertMode::Front => prepend_child(parent, child),
    }
}

fn attach_at(parent: usize, child: usize, position: usize) {
    if core::get_parent_index(child).is_some() {
        detach_link(child);
    }
    core::insert_child_at(parent, position, child);
    core::set_parent_index(child, Some(parent));
}

fn detach_link(child: usize) -> bool {
    let Some(parent) = core::get_parent_index(child) else {
        return false;
    };
    core::remove_child(parent, child);
    core::set_parent_index(child, None);
    true
}

/// Detach `child` from its parent.
///
/// Returns true if the node was attached. Observation on the node and its
/// descendants is retired either way.
pub fn detach(child: usize) -> bool {
    let was_attached = detach_link(child);
    visibility::retire(child);
    for descendant in descendants(child) {
        visibility::retire(descendant);
    }
    was_attached
}

// =============================================================================
// Navigation
// =============================================================================

/// Children of `index` in presentation order.
pub fn children(index: usize) -> Vec<usize> {
    core::get_children(index)
}

pub fn child_count(index: usize) -> usize {
    core::get_child_count(index)
}

pub fn parent(index: usize) -> Option<usize> {
    core::get_parent_index(index)
}

/// Whether `index` is `ancestor` or lies beneath it.
pub fn is_within(index: usize, ancestor: usize) -> bool {
    let mut current = Some(index);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        current = core::get_parent_index(node);
    }
    false
}

/// All descendants of `index` in depth-first pre-order (excluding `index`).
pub fn descendants(index: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut stack: Vec<usize> = core::get_children(index).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(core::get_children(node).into_iter().rev());
    }
    out
}

/// First node (including `root`) matching `pred`, depth-first pre-order.
pub fn find(root: usize, pred: impl Fn(usize) -> bool) -> Option<usize> {
    if pred(root) {
        return Some(root);
    }
    descendants(root).into_iter().find(|&node| pred(node))
}

pub fn find_by_class(root: usize, class: &str) -> Option<usize> {
    find(root, |node| core::has_class(node, class))
}

pub fn find_by_tag(root: usize, tag: &str) -> Option<usize> {
    find(root, |node| core::get_tag(node) == tag)
}

/// First node bound to `field`.
pub fn find_binding(root: usize, field: &str) -> Option<(usize, Binding)> {
    if let Some(binding) = core::get_binding(root) {
        if binding.field() == field {
            return Some((root, binding));
        }
    }
    descendants(root).into_iter().find_map(|node| {
        core::get_binding(node)
            .filter(|binding| binding.field() == field)
            .map(|binding| (node, binding))
    })
}

/// Every bound node beneath (and including) `root`.
pub fn bindings(root: usize) -> Vec<(usize, Binding)> {
    std::iter::once(root)
        .chain(descendants(root))
        .filter_map(|node| core::get_binding(node).map(|binding| (node, binding)))
        .collect()
}

// =============================================================================
// Node Properties
// =============================================================================

pub fn tag(index: usize) -> String {
    core::get_tag(index)
}

pub fn text_content(index: usize) -> String {
    text::get_text_content(index)
}

pub fn set_text_content(index: usize, content: impl Into<String>) {
    text::set_text_content(index, content.into());
}

pub fn text_revision(index: usize) -> u64 {
    text::get_text_revision(index)
}

pub fn classes(index: usize) -> Vec<String> {
    core::get_classes(index)
}

pub fn has_class(index: usize, class: &str) -> bool {
    core::has_class(index, class)
}

pub fn add_class(index: usize, class: &str) {
    core::add_class(index, class);
}

pub fn remove_class(index: usize, class: &str) {
    core::remove_class(index, class);
}

/// Replace one class with another (`classList.replace` without the return).
pub fn swap_class(index: usize, from: &str, to: &str) {
    core::remove_class(index, from);
    core::add_class(index, to);
}

pub fn attribute(index: usize, name: &str) -> Option<String> {
    core::get_attribute(index, name)
}

pub fn set_attribute(index: usize, name: &str, value: &str) {
    core::set_attribute(index, name, value);
}

pub fn remove_attribute(index: usize, name: &str) -> Option<String> {
    core::remove_attribute(index, name)
}

pub fn flags(index: usize) -> NodeFlags {
    core::get_flags(index)
}

/// Container insert mode, read from the node's flags.
pub fn insert_mode(index: usize) -> InsertMode {
    if core::get_flags(index).contains(NodeFlags::FRONT_INSERT) {
        InsertMode::Front
    } else {
        InsertMode::Back
    }
}

pub fn set_insert_mode(index: usize, mode: InsertMode) {
    core::toggle_flags(index, NodeFlags::FRONT_INSERT, mode == InsertMode::Front);
}

/// Enable or disable an input affordance (flag plus `disabled` attribute).
pub fn set_disabled(index: usize, disabled: bool) {
    core::toggle_flags(index, NodeFlags::DISABLED, disabled);
    if disabled {
        core::set_attribute(index, "disabled", "");
    } else {
        core::remove_attribute(index, "disabled");
    }
}

pub fn is_disabled(index: usize) -> bool {
    core::get_flags(index).contains(NodeFlags::DISABLED)
}

/// Concatenated text of `index` and its descendants (`textContent` reading).
pub fn deep_text(index: usize) -> String {
    std::iter::once(index)
        .chain(descendants(index))
        .map(text::get_text_content)
        .collect()
}
