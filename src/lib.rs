//! # spark-bind
//!
//! Reactive data binding for presentation trees.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! node state arrays.
//!
//! ## Architecture
//!
//! Typed entities own a node in a thread-local presentation tree. Each schema
//! field with a display slot mirrors its formatted value into that slot's
//! text; each `sequence` field mirrors an ordered list of child entities into
//! a container node.
//!
//! ```text
//! raw record ─▶ EntityFactory ─▶ EntityType ─▶ TemplateRegistry ─▶ Blueprint
//!                                    │                                │
//!                                    ▼                                ▼
//!                     coerce ─▶ Entity ──────── owns ──────────▶ node index
//!                                    │
//!                                    └─ ObservableSequence ─▶ container children
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Field kinds and values, timestamps, node flags
//! - [`engine`] - Node registry, parallel arrays, tree, visibility
//! - [`coerce`] - Raw JSON → typed field values
//! - [`template`] - Blueprints and the per-type template registry
//! - [`entity`] - Entity types, schemas and observable entities
//! - [`sequence`] - Ordered entity collections mirrored into containers
//! - [`pagination`] - One-shot "load older" trigger on a sequence frontier
//! - [`chat`] - A chat room controller built on the above

pub mod chat;
pub mod coerce;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod pagination;
pub mod sequence;
pub mod template;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use engine::{
    allocate_index, get_allocated_count, is_allocated, on_destroy, release_index, reset_registry,
};

pub use coerce::coerce;
pub use config::{BindConfig, ChatConfig};
pub use entity::{BindContext, Entity, EntityType, FieldSpec, Schema};
pub use error::{BindError, CoercionError, Result};
pub use pagination::{Frontier, PaginationCursor, PaginationTrigger};
pub use sequence::{AppendReport, EntityFactory, ObservableSequence};
pub use template::{Blueprint, TemplateRegistry};

pub use chat::{ChatController, ChatState, Transport, TransportEvent};
