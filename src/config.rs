//! Configuration.
//!
//! Plain structs with `Default`, deserializable from JSON so a host can load
//! them from whatever file or page data it already has.
//!
//! ```ignore
//! let config = ChatConfig::from_json(r#"{
//!     "url": "wss://chat.example",
//!     "username": "alice",
//!     "tenant": "acme",
//!     "room": "general"
//! }"#)?;
//! assert_eq!(config.room_key(), "acme:general");
//! ```

use serde::Deserialize;

use crate::error::{BindError, Result};
use crate::types::CoercionPolicy;

/// Options for the binding engine itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BindConfig {
    /// What to do with values that fail coercion.
    pub coercion: CoercionPolicy,
}

impl BindConfig {
    /// Fail entity construction on any coercion error.
    pub fn strict() -> Self {
        Self { coercion: CoercionPolicy::Strict }
    }
}

/// Options for the chat controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Transport endpoint (handed to the transport, unused by the controller).
    pub url: String,
    /// The local user's name; drives own-message classification.
    pub username: String,
    /// Auth token (handed to the transport).
    pub token: String,
    pub tenant: String,
    pub room: String,
    /// Text of the placeholder shown until the transport connects.
    pub connecting_text: String,
    /// Username stamped on synthetic system messages.
    pub system_username: String,
    /// Message of a connect error that is treated as an authorization failure.
    pub unauthorized_message: String,
    pub bind: BindConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            token: String::new(),
            tenant: String::new(),
            room: String::new(),
            connecting_text: "Connecting...".to_string(),
            system_username: "chat-system".to_string(),
            unauthorized_message: "Unauthorized".to_string(),
            bind: BindConfig::default(),
        }
    }
}

impl ChatConfig {
    /// Parse from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(BindError::Config)
    }

    /// Room key sent with `join`: `{tenant}:{room}`.
    pub fn room_key(&self) -> String {
        format!("{}:{}", self.tenant, self.room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.connecting_text, "Connecting...");
        assert_eq!(config.system_username, "chat-system");
        assert_eq!(config.bind.coercion, CoercionPolicy::Lenient);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ChatConfig::from_json(
            r#"{"username": "alice", "tenant": "acme", "room": "general",
                "bind": {"coercion": "strict"}}"#,
        )
        .unwrap();

        assert_eq!(config.username, "alice");
        assert_eq!(config.room_key(), "acme:general");
        assert_eq!(config.bind, BindConfig::strict());
        assert_eq!(config.connecting_text, "Connecting...");
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = ChatConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, BindError::Config(_)));
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
