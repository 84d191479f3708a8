//! Transport seam.
//!
//! The controller never talks to a socket. It consumes [`TransportEvent`]s
//! the host feeds it and calls back into a [`Transport`] for outbound
//! traffic. Events can be decoded straight from JSON frames:
//!
//! ```text
//! {"event": "connected"}
//! {"event": "connect_error", "data": "Unauthorized"}
//! {"event": "joined", "data": {"users": [...], "messages": [...]}}
//! {"event": "new_message", "data": {"username": "bob", "msg": "hi", "timestamp": 1714566600000}}
//! {"event": "user_left", "data": [{"id": "u1"}]}
//! {"event": "older_messages", "data": [...]}
//! ```

use std::cell::RefCell;

use serde::Deserialize;

use crate::error::{BindError, Result};
use crate::types::RawRecord;

/// Outbound half of a realtime connection.
///
/// Methods take `&self` so a shared `Rc<dyn Transport>` can be captured by
/// callbacks.
pub trait Transport {
    /// Join `room` (`{tenant}:{room}`) as `username`.
    fn join(&self, username: &str, room: &str);

    fn send_message(&self, text: &str);

    /// Ask for messages older than `anchor_ms` (epoch millis).
    fn request_older(&self, anchor_ms: i64);
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TransportEvent {
    Connected,
    ConnectError(String),
    Joined {
        #[serde(default)]
        users: Vec<RawRecord>,
        #[serde(default)]
        messages: Vec<RawRecord>,
    },
    NewUser(RawRecord),
    NewMessage(RawRecord),
    /// Users still connected after someone left.
    UserLeft(Vec<RawRecord>),
    OlderMessages(Vec<RawRecord>),
}

impl TransportEvent {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(BindError::Decode)
    }
}

/// One call made on a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Join { username: String, room: String },
    Message(String),
    RequestOlder(i64),
}

/// Transport that records every outbound call.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: RefCell<Vec<Outbound>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Outbound> {
        self.sent.borrow().clone()
    }

    /// Drain the recorded calls.
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }
}

impl Transport for RecordingTransport {
    fn join(&self, username: &str, room: &str) {
        self.sent.borrow_mut().push(Outbound::Join {
            username: username.to_string(),
            room: room.to_string(),
        });
    }

    fn send_message(&self, text: &str) {
        self.sent.borrow_mut().push(Outbound::Message(text.to_string()));
    }

    fn request_older(&self, anchor_ms: i64) {
        self.sent.borrow_mut().push(Outbound::RequestOlder(anchor_ms));
    }
}
