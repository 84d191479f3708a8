//! Templates - Blueprints and their per-type registry.

mod blueprint;
mod registry;

pub use blueprint::Blueprint;
pub use registry::TemplateRegistry;
