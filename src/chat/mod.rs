//! Chat - A realtime chat room built on observable entities.
//!
//! - [`kinds`] - The chat entity types and their decorators
//! - [`classify`] - Record → type policy relative to the local user
//! - [`templates`] - Default markup
//! - [`transport`] - Outbound trait and inbound events
//! - [`controller`] - The event-driven controller tying it together

pub mod classify;
pub mod controller;
pub mod kinds;
pub mod templates;
pub mod transport;

pub use classify::ChatClassifier;
pub use controller::{ChatController, ChatState};
pub use kinds::ChatKinds;
pub use templates::default_registry;
pub use transport::{Outbound, RecordingTransport, Transport, TransportEvent};
