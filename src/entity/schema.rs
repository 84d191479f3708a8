//! Schemas and entity types.
//!
//! An [`EntityType`] is an explicit type tag: its name, an explicit ordered
//! list of ancestor names (nearest first), its field schema and an ordered
//! list of render decorators. Deriving a type with [`EntityType::extend`]
//! copies the parent's ancestors, schema and decorators, so the chain is
//! plain data and never needs reflection.

use std::fmt;
use std::rc::Rc;

use super::Entity;
use crate::types::{FieldKind, FieldValue};

/// Field-specific display formatter.
pub type Formatter = Rc<dyn Fn(&FieldValue) -> String>;

/// Render decoration step, run once after an entity's node is built.
pub type Decorator = Rc<dyn Fn(&Entity)>;

// =============================================================================
// Field Spec
// =============================================================================

#[derive(Clone)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub formatter: Option<Formatter>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self { kind, formatter: None }
    }

    /// Display string for `value`: the formatter if any, else the default.
    pub fn format(&self, value: &FieldValue) -> String {
        match &self.formatter {
            Some(formatter) => formatter(value),
            None => value.display(),
        }
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("kind", &self.kind)
            .field("formatter", &self.formatter.is_some())
            .finish()
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Ordered field declarations.
#[derive(Clone, Default, Debug)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` (replacing an earlier declaration of the same name).
    pub fn field(self, name: &str, kind: FieldKind) -> Self {
        self.declare(name, FieldSpec::new(kind))
    }

    /// Declare `name` with a display formatter.
    pub fn formatted(
        self,
        name: &str,
        kind: FieldKind,
        formatter: impl Fn(&FieldValue) -> String + 'static,
    ) -> Self {
        self.declare(name, FieldSpec { kind, formatter: Some(Rc::new(formatter)) })
    }

    fn declare(mut self, name: &str, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, existing)) => *existing = spec,
            None => self.fields.push((name.to_string(), spec)),
        }
        self
    }

    /// Fold `other` into this schema; `other` wins on conflicts.
    pub fn merge(mut self, other: Schema) -> Self {
        for (name, spec) in other.fields {
            self = self.declare(&name, spec);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// =============================================================================
// Entity Type
// =============================================================================

#[derive(Clone)]
pub struct EntityType {
    name: String,
    ancestors: Vec<String>,
    schema: Schema,
    decorators: Vec<Decorator>,
}

impl EntityType {
    /// A root type with no ancestors.
    pub fn new(name: &str, schema: Schema) -> Self {
        Self {
            name: name.to_string(),
            ancestors: Vec::new(),
            schema,
            decorators: Vec::new(),
        }
    }

    /// A subtype of `parent`, inheriting its schema and decorators.
    pub fn extend(parent: &EntityType, name: &str) -> Self {
        let mut ancestors = Vec::with_capacity(parent.ancestors.len() + 1);
        ancestors.push(parent.name.clone());
        ancestors.extend(parent.ancestors.iter().cloned());
        Self {
            name: name.to_string(),
            ancestors,
            schema: parent.schema.clone(),
            decorators: parent.decorators.clone(),
        }
    }

    /// Add or override fields.
    pub fn with_fields(mut self, schema: Schema) -> Self {
        self.schema = self.schema.merge(schema);
        self
    }

    /// Append a decorator. Inherited decorators run first.
    pub fn decorate(mut self, decorator: impl Fn(&Entity) + 'static) -> Self {
        self.decorators.push(Rc::new(decorator));
        self
    }

    pub fn into_rc(self) -> Rc<Self> {
        Rc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ancestor names, nearest first.
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// Own name followed by the ancestors: the template lookup order.
    pub fn chain(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.ancestors.iter().map(String::as_str))
            .collect()
    }

    pub fn is_a(&self, name: &str) -> bool {
        self.name == name || self.ancestors.iter().any(|a| a == name)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn decorators(&self) -> &[Decorator] {
        &self.decorators
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field("ancestors", &self.ancestors)
            .field("schema", &self.schema)
            .field("decorators", &self.decorators.len())
            .finish()
    }
}
