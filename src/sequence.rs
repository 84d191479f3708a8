//! Observable Sequence - An ordered list of entities mirrored into a container.
//!
//! The backing list and the container's children always hold the same
//! entities in the same order: index `i` of the sequence is child `i` of the
//! container. Insert mode lives on the container node and decides where new
//! items land:
//!
//! - `Back`: each item becomes the last child
//! - `Front`: each item becomes the first child
//!
//! Removal detaches the node (retiring any visibility observation) before the
//! backing entry goes away.

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::engine::{arrays::core, tree};
use crate::entity::{BindContext, Entity, EntityType};
use crate::error::BindError;
use crate::types::{InsertMode, NodeFlags, RawRecord};

// =============================================================================
// Entity Factory
// =============================================================================

/// Chooses the concrete entity type for a raw record of a collection.
///
/// Returning `None` means the record violates the collection's
/// classification contract; the item is skipped.
pub trait EntityFactory {
    fn classify(&self, collection: &str, raw: &RawRecord) -> Option<Rc<EntityType>>;
}

impl<F> EntityFactory for F
where
    F: Fn(&str, &RawRecord) -> Option<Rc<EntityType>>,
{
    fn classify(&self, collection: &str, raw: &RawRecord) -> Option<Rc<EntityType>> {
        self(collection, raw)
    }
}

// =============================================================================
// Append Report
// =============================================================================

/// Outcome of a batch append. Failed items do not affect the others.
#[derive(Debug, Default)]
pub struct AppendReport {
    pub inserted: usize,
    pub failed: Vec<BindError>,
}

impl AppendReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// =============================================================================
// Observable Sequence
// =============================================================================

pub struct ObservableSequence {
    collection: String,
    container: usize,
    ctx: BindContext,
    items: Vec<Entity>,
}

impl ObservableSequence {
    /// Sequence for `collection`, rendering into `container`.
    pub fn new(collection: &str, container: usize, ctx: BindContext) -> Self {
        core::toggle_flags(container, NodeFlags::CONTAINER, true);
        Self {
            collection: collection.to_string(),
            container,
            ctx,
            items: Vec::new(),
        }
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Classify, build and insert each record in the current insert mode.
    pub fn append_all(&mut self, records: &[RawRecord]) -> AppendReport {
        let mut report = AppendReport::default();
        for raw in records {
            match self.build(raw) {
                Ok(entity) => {
                    self.insert(entity);
                    report.inserted += 1;
                }
                Err(err) => {
                    warn!(collection = %self.collection, error = %err, "skipping item");
                    report.failed.push(err);
                }
            }
        }
        debug!(
            collection = %self.collection,
            inserted = report.inserted,
            failed = report.failed.len(),
            mode = ?self.insert_mode(),
            "append_all"
        );
        report
    }

    /// Insert already-built entities in the current insert mode.
    pub fn append_entities(&mut self, entities: impl IntoIterator<Item = Entity>) -> usize {
        let mut inserted = 0;
        for entity in entities {
            self.insert(entity);
            inserted += 1;
        }
        inserted
    }

    /// Switch to front mode (it stays) and append.
    pub fn prepend_all(&mut self, records: &[RawRecord]) -> AppendReport {
        self.set_insert_mode(InsertMode::Front);
        self.append_all(records)
    }

    /// Append in `mode`, then restore the previous mode.
    pub fn append_all_in(&mut self, mode: InsertMode, records: &[RawRecord]) -> AppendReport {
        let previous = self.insert_mode();
        self.set_insert_mode(mode);
        let report = self.append_all(records);
        self.set_insert_mode(previous);
        report
    }

    pub fn set_insert_mode(&mut self, mode: InsertMode) {
        tree::set_insert_mode(self.container, mode);
    }

    pub fn insert_mode(&self) -> InsertMode {
        tree::insert_mode(self.container)
    }

    fn build(&self, raw: &RawRecord) -> Result<Entity, BindError> {
        let ty = self
            .ctx
            .factory
            .classify(&self.collection, raw)
            .ok_or_else(|| BindError::Classification {
                collection: self.collection.clone(),
            })?;
        Entity::create(&ty, raw, &self.ctx)
    }

    fn insert(&mut self, mut entity: Entity) {
        let mode = self.insert_mode();
        tree::insert_child(self.container, entity.node(), mode);
        entity.set_container(Some(self.container));
        match mode {
            InsertMode::Back => self.items.push(entity),
            InsertMode::Front => self.items.insert(0, entity),
        }
        debug_assert!(self.is_mirrored(), "sequence out of order with its container");
    }

    // =========================================================================
    // Removal
    // =========================================================================

    /// Remove and return the entity at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<Entity> {
        if index >= self.items.len() {
            return None;
        }
        tree::detach(self.items[index].node());
        let mut entity = self.items.remove(index);
        entity.set_container(None);
        debug!(collection = %self.collection, index, "removed");
        Some(entity)
    }

    /// Remove up to `count` entities starting at `start`.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Vec<Entity> {
        let start = start.min(self.items.len());
        let end = start.saturating_add(count).min(self.items.len());
        for entity in &self.items[start..end] {
            tree::detach(entity.node());
        }
        let removed: Vec<Entity> = self
            .items
            .drain(start..end)
            .map(|mut entity| {
                entity.set_container(None);
                entity
            })
            .collect();
        if !removed.is_empty() {
            debug!(collection = %self.collection, start, count = removed.len(), "removed range");
        }
        removed
    }

    /// Keep the first `len` entities, returning the rest.
    pub fn truncate(&mut self, len: usize) -> Vec<Entity> {
        let count = self.items.len().saturating_sub(len);
        self.remove_range(len, count)
    }

    /// Remove the last entity.
    pub fn pop(&mut self) -> Option<Entity> {
        let last = self.items.len().checked_sub(1)?;
        self.remove_at(last)
    }

    /// Remove every entity; their nodes are released.
    pub fn clear(&mut self) {
        let count = self.items.len();
        drop(self.remove_range(0, count));
    }

    /// Remove every entity for which `keep` returns false. Returns how many
    /// were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&Entity) -> bool) -> usize {
        let mut removed = 0;
        let mut index = 0;
        while index < self.items.len() {
            if keep(&self.items[index]) {
                index += 1;
            } else {
                drop(self.remove_at(index));
                removed += 1;
            }
        }
        removed
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Index of the first entity matching `pred`.
    pub fn find_first(&self, pred: impl Fn(&Entity) -> bool) -> Option<usize> {
        self.items.iter().position(pred)
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.items.get_mut(index)
    }

    pub fn first(&self) -> Option<&Entity> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Entity> {
        self.items.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Container node the entities render into.
    pub fn container(&self) -> usize {
        self.container
    }

    /// Collection name passed to the factory.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// True when the container's children are exactly the entity nodes, in
    /// order.
    pub fn is_mirrored(&self) -> bool {
        let nodes: Vec<usize> = self.items.iter().map(Entity::node).collect();
        tree::children(self.container) == nodes
    }
}

impl<'a> IntoIterator for &'a ObservableSequence {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Debug for ObservableSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableSequence")
            .field("collection", &self.collection)
            .field("container", &self.container)
            .field("items", &self.items.len())
            .finish()
    }
}
