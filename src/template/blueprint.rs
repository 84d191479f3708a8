//! Blueprint - Cloneable description of a presentation subtree.
//!
//! A blueprint is inert data. [`Blueprint::instantiate`] deep-clones it into
//! freshly allocated engine nodes and returns the root index; every call
//! produces an independent subtree.
//!
//! # Example
//!
//! ```ignore
//! let message = Blueprint::new("div")
//!     .class("chat")
//!     .class("chat-start")
//!     .child(Blueprint::new("div").class("chat-bubble").display("msg"));
//!
//! let node = message.instantiate();
//! ```

use crate::engine::{allocate_index, arrays::core, tree};
use crate::types::{Binding, InsertMode, NodeFlags};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blueprint {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub binding: Option<Binding>,
    /// Initial insert mode, meaningful for container bindings only.
    pub insert_mode: InsertMode,
    pub disabled: bool,
    pub children: Vec<Blueprint>,
}

impl Blueprint {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Mark this node as the display slot of `field`.
    pub fn display(mut self, field: &str) -> Self {
        self.binding = Some(Binding::Display(field.to_string()));
        self
    }

    /// Mark this node as the container of sequence `field`.
    pub fn container(mut self, field: &str) -> Self {
        self.binding = Some(Binding::Container(field.to_string()));
        self
    }

    pub fn insert_mode(mut self, mode: InsertMode) -> Self {
        self.insert_mode = mode;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn child(mut self, child: Blueprint) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes `instantiate` will allocate.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Blueprint::node_count).sum::<usize>()
    }

    /// Clone into live nodes. Returns the (detached) root index.
    pub fn instantiate(&self) -> usize {
        let index = allocate_index();

        core::set_tag(index, &self.tag);
        for class in &self.classes {
            core::add_class(index, class);
        }
        for (name, value) in &self.attributes {
            core::set_attribute(index, name, value);
        }
        if !self.text.is_empty() {
            tree::set_text_content(index, self.text.clone());
        }
        if let Some(binding) = &self.binding {
            if matches!(binding, Binding::Container(_)) {
                core::toggle_flags(index, NodeFlags::CONTAINER, true);
                tree::set_insert_mode(index, self.insert_mode);
            }
            core::set_binding(index, Some(binding.clone()));
        }
        if self.disabled {
            tree::set_disabled(index, true);
        }

        for child in &self.children {
            let child_index = child.instantiate();
            tree::append_child(index, child_index);
        }

        index
    }
}
