//! Observable Entity - A schema-bound field bag that owns one presentation node.
//!
//! # Construction
//!
//! 1. Resolve the blueprint along the type chain and instantiate a node
//! 2. Coerce every scalar schema field from the raw record and store it
//! 3. Store fields the schema does not declare verbatim (not reactive)
//! 4. Run the type's decorators, base type first
//! 5. Bind display slots and push each slot's initial text
//! 6. Build a nested [`ObservableSequence`] for every `sequence` field
//!
//! # Writes
//!
//! [`Entity::set`] dispatches through the schema and the slot table: a
//! slotted field gets exactly one text write per call, everything else is
//! pure storage.
//!
//! # Lifetime
//!
//! The node lives exactly as long as the entity. Dropping the entity drops
//! its nested sequences, then releases (and thereby detaches) its node.

mod schema;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

pub use schema::{Decorator, EntityType, FieldSpec, Formatter, Schema};

use crate::coerce::coerce;
use crate::config::BindConfig;
use crate::engine::{release_index, tree};
use crate::error::{BindError, Result};
use crate::sequence::{EntityFactory, ObservableSequence};
use crate::template::TemplateRegistry;
use crate::types::{Binding, CoercionPolicy, FieldKind, FieldValue, RawRecord};

// =============================================================================
// Bind Context
// =============================================================================

/// Everything entity construction needs besides the record itself.
#[derive(Clone)]
pub struct BindContext {
    pub registry: Rc<TemplateRegistry>,
    pub factory: Rc<dyn EntityFactory>,
    pub config: BindConfig,
}

impl BindContext {
    pub fn new(
        registry: Rc<TemplateRegistry>,
        factory: Rc<dyn EntityFactory>,
        config: BindConfig,
    ) -> Self {
        Self { registry, factory, config }
    }
}

impl fmt::Debug for BindContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindContext")
            .field("templates", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}

// =============================================================================
// Entity
// =============================================================================

pub struct Entity {
    ty: Rc<EntityType>,
    node: usize,
    /// Container node holding this entity's node (non-owning).
    container: Option<usize>,
    policy: CoercionPolicy,
    values: HashMap<String, FieldValue>,
    slots: HashMap<String, usize>,
    sequences: HashMap<String, ObservableSequence>,
}

impl Entity {
    /// Build an entity of type `ty` from `raw`.
    ///
    /// Fails with `TemplateNotFound` when no blueprint matches the chain,
    /// `Coercion` under the strict policy, and `MissingContainer` when a
    /// sequence field has no container slot. Nothing leaks on failure.
    pub fn create(ty: &Rc<EntityType>, raw: &RawRecord, ctx: &BindContext) -> Result<Self> {
        let blueprint = ctx.registry.resolve(&ty.chain())?;
        let node = blueprint.instantiate();

        // From here on, an early return drops `entity` and releases `node`.
        let mut entity = Self {
            ty: ty.clone(),
            node,
            container: None,
            policy: ctx.config.coercion,
            values: HashMap::new(),
            slots: HashMap::new(),
            sequences: HashMap::new(),
        };

        for (name, spec) in ty.schema().iter() {
            let value = coerce(raw.get(name), spec.kind, entity.policy)
                .map_err(|err| err.for_field(name))?;
            if let Some(value) = value {
                if value.is_invalid() {
                    warn!(entity = ty.name(), field = name, ?value, "field failed coercion");
                }
                entity.values.insert(name.to_string(), value);
            }
        }
        for (name, value) in raw {
            if ty.schema().get(name).is_none() {
                entity.values.insert(name.clone(), FieldValue::Raw(value.clone()));
            }
        }

        for decorator in ty.decorators() {
            decorator(&entity);
        }

        for (slot, binding) in tree::bindings(entity.node) {
            if let Binding::Display(field) = binding {
                let scalar = ty.schema().get(&field).is_some_and(|spec| spec.kind.is_scalar());
                if scalar && !entity.slots.contains_key(&field) {
                    entity.slots.insert(field, slot);
                }
            }
        }
        let slotted: Vec<(String, usize)> =
            entity.slots.iter().map(|(field, slot)| (field.clone(), *slot)).collect();
        for (field, slot) in slotted {
            entity.render_slot(&field, slot);
        }

        for (name, spec) in ty.schema().iter() {
            if spec.kind != FieldKind::Sequence {
                continue;
            }
            let container = match tree::find_binding(entity.node, name) {
                Some((container, Binding::Container(_))) => container,
                _ => return Err(BindError::MissingContainer { field: name.to_string() }),
            };
            let mut sequence = ObservableSequence::new(name, container, ctx.clone());
            if let Some(Value::Array(items)) = raw.get(name) {
                let records: Vec<RawRecord> =
                    items.iter().filter_map(|item| item.as_object().cloned()).collect();
                sequence.append_all(&records);
            }
            entity.sequences.insert(name.to_string(), sequence);
        }

        debug!(entity = ty.name(), node, slots = entity.slots.len(), "entity created");
        Ok(entity)
    }

    // =========================================================================
    // Field Access
    // =========================================================================

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    /// Text value of `field`, if it holds text.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.values.get(field).and_then(FieldValue::as_text)
    }

    /// Store `value`; re-render the field's slot if it has one.
    ///
    /// Returns true when a slot was written. Fields outside the schema are
    /// stored verbatim and never rendered; `sequence` fields cannot be set.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> bool {
        let value = value.into();
        match self.ty.schema().get(field) {
            Some(spec) if spec.kind == FieldKind::Sequence => {
                warn!(entity = self.ty.name(), field, "cannot set a sequence field");
                return false;
            }
            Some(_) => {}
            None => {
                self.values.insert(field.to_string(), value);
                return false;
            }
        }

        self.values.insert(field.to_string(), value);
        match self.slots.get(field).copied() {
            Some(slot) => {
                self.render_slot(field, slot);
                true
            }
            None => false,
        }
    }

    /// Coerce `raw` with the field's declared kind, then [`set`](Self::set).
    pub fn set_raw(&mut self, field: &str, raw: &Value) -> Result<bool> {
        let kind = match self.ty.schema().get(field) {
            Some(spec) => spec.kind,
            None => return Ok(self.set(field, FieldValue::Raw(raw.clone()))),
        };
        match coerce(Some(raw), kind, self.policy).map_err(|err| err.for_field(field))? {
            Some(value) => Ok(self.set(field, value)),
            None => Ok(false),
        }
    }

    /// Iterate every stored field.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn render_slot(&self, field: &str, slot: usize) {
        let (Some(value), Some(spec)) = (self.values.get(field), self.ty.schema().get(field)) else {
            return;
        };
        tree::set_text_content(slot, spec.format(value));
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// The presentation node this entity owns.
    pub fn node(&self) -> usize {
        self.node
    }

    /// Display slot bound to `field`.
    pub fn slot(&self, field: &str) -> Option<usize> {
        self.slots.get(field).copied()
    }

    /// Container node currently holding this entity, if any.
    pub fn container(&self) -> Option<usize> {
        self.container
    }

    pub(crate) fn set_container(&mut self, container: Option<usize>) {
        self.container = container;
    }

    pub fn sequence(&self, field: &str) -> Option<&ObservableSequence> {
        self.sequences.get(field)
    }

    pub fn sequence_mut(&mut self, field: &str) -> Option<&mut ObservableSequence> {
        self.sequences.get_mut(field)
    }

    /// Like [`sequence_mut`](Self::sequence_mut), as an error when missing.
    pub fn try_sequence_mut(&mut self, field: &str) -> Result<&mut ObservableSequence> {
        self.sequences
            .get_mut(field)
            .ok_or_else(|| BindError::UnknownField { field: field.to_string() })
    }

    /// First node under this entity's node carrying `class`.
    pub fn find_class(&self, class: &str) -> Option<usize> {
        tree::find_by_class(self.node, class)
    }

    pub fn entity_type(&self) -> &Rc<EntityType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn is_a(&self, name: &str) -> bool {
        self.ty.is_a(name)
    }
}

impl Drop for Entity {
    fn drop(&mut self) {
        self.sequences.clear();
        release_index(self.node);
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("type", &self.ty.name())
            .field("node", &self.node)
            .field("container", &self.container)
            .field("values", &self.values)
            .field("sequences", &self.sequences)
            .finish()
    }
}
