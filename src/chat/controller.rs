//! Chat Controller - Maps transport events onto the chat entity tree.
//!
//! ```text
//!              Connected + Joined
//! Connecting ───────────────────────▶ Joined
//!     │
//!     │ ConnectError("Unauthorized")
//!     ▼
//!   Error (terminal: later events are dropped)
//! ```
//!
//! Message order: the transport delivers snapshots and older batches newest
//! first. The initial snapshot is appended in back mode, then the message
//! container switches to front mode so live messages land on top. The
//! oldest message is the last child, which is where pagination watches.

use std::collections::HashSet;
use std::rc::Rc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::classify::ChatClassifier;
use super::kinds::ChatKinds;
use super::transport::{Transport, TransportEvent};
use crate::config::ChatConfig;
use crate::entity::{BindContext, Entity};
use crate::error::{BindError, Result};
use crate::engine::tree;
use crate::pagination::{Frontier, PaginationTrigger};
use crate::sequence::{AppendReport, ObservableSequence};
use crate::template::TemplateRegistry;
use crate::types::{InsertMode, RawRecord, Timestamp};

const USERS: &str = "users";
const MSGS: &str = "msgs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Connecting,
    Joined,
    Error,
}

pub struct ChatController {
    config: ChatConfig,
    transport: Rc<dyn Transport>,
    kinds: ChatKinds,
    ctx: BindContext,
    chat: Entity,
    trigger: PaginationTrigger,
    input: Option<usize>,
    button: Option<usize>,
    state: ChatState,
}

impl ChatController {
    /// Build the chat tree and show the connecting placeholder.
    ///
    /// Fails when `registry` has no template for the chat itself.
    pub fn new(
        config: ChatConfig,
        transport: Rc<dyn Transport>,
        registry: Rc<TemplateRegistry>,
    ) -> Result<Self> {
        let kinds = ChatKinds::new();
        let classifier = ChatClassifier::new(&config.username, kinds.clone());
        let ctx = BindContext::new(registry, Rc::new(classifier), config.bind.clone());

        let chat = Entity::create(&kinds.chat, &RawRecord::new(), &ctx)?;
        let form = tree::find_by_tag(chat.node(), "form");
        let input = form.and_then(|form| tree::find_by_tag(form, "input"));
        let button = form.and_then(|form| tree::find_by_tag(form, "button"));

        let requester = transport.clone();
        let trigger = PaginationTrigger::new(Frontier::Back, "timestamp", move |anchor| {
            match anchor.as_timestamp() {
                Some(ts) => requester.request_older(ts.millis()),
                None => warn!(?anchor, "oldest message has no timestamp"),
            }
        });

        let mut controller = Self {
            config,
            transport,
            kinds,
            ctx,
            chat,
            trigger,
            input,
            button,
            state: ChatState::Connecting,
        };
        let placeholder = controller.config.connecting_text.clone();
        controller.push_system_message(&placeholder, "info")?;

        info!(user = %controller.config.username, room = %controller.config.room_key(), "chat connecting");
        Ok(controller)
    }

    /// Apply one transport event.
    ///
    /// An authorization failure moves to [`ChatState::Error`] and is returned
    /// as [`BindError::TransportAuth`] after the error message is shown.
    /// Once in that state every further event is ignored.
    pub fn handle(&mut self, event: TransportEvent) -> Result<()> {
        if self.state == ChatState::Error {
            warn!(?event, "event after authorization failure ignored");
            return Ok(());
        }
        match event {
            TransportEvent::Connected => self.on_connected(),
            TransportEvent::ConnectError(message) => self.on_connect_error(message),
            TransportEvent::Joined { users, messages } => self.on_joined(&users, &messages),
            TransportEvent::NewUser(raw) => {
                let report = self.chat.try_sequence_mut(USERS)?.append_all(&[raw]);
                log_failures("new user", &report);
                Ok(())
            }
            TransportEvent::NewMessage(raw) => {
                let msgs = self.chat.try_sequence_mut(MSGS)?;
                let report = msgs.append_all_in(InsertMode::Front, &[raw]);
                log_failures("new message", &report);
                Ok(())
            }
            TransportEvent::UserLeft(remaining) => self.on_user_left(&remaining),
            TransportEvent::OlderMessages(batch) => self.on_older_messages(&batch),
        }
    }

    /// Send `text` as a chat message and clear the input.
    ///
    /// Returns false (sending nothing) until the room is joined with the
    /// input enabled.
    pub fn submit(&mut self, text: &str) -> bool {
        let Some(input) = self.input else {
            return false;
        };
        if self.state != ChatState::Joined || tree::is_disabled(input) {
            return false;
        }
        self.transport.send_message(text);
        tree::set_attribute(input, "value", "");
        debug!(len = text.len(), "message submitted");
        true
    }

    // =========================================================================
    // Event Handlers
    // =========================================================================

    fn on_connected(&mut self) -> Result<()> {
        for node in [self.input, self.button].into_iter().flatten() {
            tree::set_disabled(node, false);
        }
        self.remove_placeholder()?;
        self.transport.join(&self.config.username, &self.config.room_key());
        info!(room = %self.config.room_key(), "chat connected, joining");
        Ok(())
    }

    fn on_connect_error(&mut self, message: String) -> Result<()> {
        if message != self.config.unauthorized_message {
            warn!(error = %message, "connect error");
            return Ok(());
        }
        self.remove_placeholder()?;
        self.push_system_message(&message, "error")?;
        self.state = ChatState::Error;
        info!(state = ?self.state, "chat unauthorized");
        Err(BindError::TransportAuth(message))
    }

    fn on_joined(&mut self, users: &[RawRecord], messages: &[RawRecord]) -> Result<()> {
        let report = self.chat.try_sequence_mut(USERS)?.append_all(users);
        log_failures("joined users", &report);

        let msgs = self.chat.try_sequence_mut(MSGS)?;
        let report = msgs.append_all_in(InsertMode::Back, messages);
        log_failures("joined messages", &report);
        msgs.set_insert_mode(InsertMode::Front);
        self.trigger.arm(msgs);

        self.state = ChatState::Joined;
        info!(users = users.len(), messages = messages.len(), "chat joined");
        Ok(())
    }

    fn on_user_left(&mut self, remaining: &[RawRecord]) -> Result<()> {
        let connected: HashSet<String> = remaining
            .iter()
            .filter_map(|raw| raw.get("id"))
            .filter_map(record_id)
            .collect();
        let removed = self
            .chat
            .try_sequence_mut(USERS)?
            .retain(|user| user.text("id").is_some_and(|id| connected.contains(id)));
        debug!(removed, "users left");
        Ok(())
    }

    fn on_older_messages(&mut self, batch: &[RawRecord]) -> Result<()> {
        let msgs = self.chat.try_sequence_mut(MSGS)?;
        if !batch.is_empty() {
            let report = msgs.append_all_in(InsertMode::Back, batch);
            log_failures("older messages", &report);
        }
        self.trigger.rearm_after_batch(msgs, batch.len());
        Ok(())
    }

    // =========================================================================
    // System Messages
    // =========================================================================

    fn push_system_message(&mut self, msg: &str, level: &str) -> Result<()> {
        let raw = json!({
            "username": self.config.system_username,
            "msg": msg,
            "level": level,
            "timestamp": Timestamp::now().millis(),
        });
        let raw = raw.as_object().cloned().unwrap_or_default();
        let entity = Entity::create(&self.kinds.sys_message, &raw, &self.ctx)?;
        self.chat.try_sequence_mut(MSGS)?.append_entities([entity]);
        Ok(())
    }

    fn remove_placeholder(&mut self) -> Result<()> {
        let placeholder = self.config.connecting_text.as_str();
        let msgs = self.chat.try_sequence_mut(MSGS)?;
        let index = msgs.find_first(|m| m.is_a("SysMessage") && m.text("msg") == Some(placeholder));
        if let Some(index) = index {
            drop(msgs.remove_at(index));
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Root chat entity.
    pub fn chat(&self) -> &Entity {
        &self.chat
    }

    pub fn users(&self) -> Option<&ObservableSequence> {
        self.chat.sequence(USERS)
    }

    pub fn messages(&self) -> Option<&ObservableSequence> {
        self.chat.sequence(MSGS)
    }

    pub fn trigger(&self) -> &PaginationTrigger {
        &self.trigger
    }

    /// Message input node, if the chat template has one.
    pub fn input(&self) -> Option<usize> {
        self.input
    }

    pub fn button(&self) -> Option<usize> {
        self.button
    }
}

impl Drop for ChatController {
    fn drop(&mut self) {
        self.trigger.disarm();
    }
}

fn record_id(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(id) => Some(id.clone()),
        other => Some(other.to_string()),
    }
}

fn log_failures(what: &str, report: &AppendReport) {
    if !report.is_complete() {
        warn!(what, failed = report.failed.len(), inserted = report.inserted, "items skipped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::templates::default_registry;
    use crate::chat::transport::{Outbound, RecordingTransport};
    use crate::config::BindConfig;
    use crate::engine::{reset_registry, visibility};

    fn setup() -> (ChatController, Rc<RecordingTransport>) {
        reset_registry();
        let config = ChatConfig {
            username: "alice".to_string(),
            tenant: "acme".to_string(),
            room: "general".to_string(),
            ..Default::default()
        };
        let transport = Rc::new(RecordingTransport::new());
        let controller =
            ChatController::new(config, transport.clone(), Rc::new(default_registry())).unwrap();
        (controller, transport)
    }

    fn msg(username: &str, text: &str, timestamp: i64) -> RawRecord {
        json!({"username": username, "msg": text, "timestamp": timestamp})
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    fn user(id: &str, username: &str) -> RawRecord {
        json!({"id": id, "username": username})
            .as_object()
            .cloned()
            .unwrap_or_default()
    }

    fn texts(controller: &ChatController) -> Vec<String> {
        controller
            .messages()
            .map(|msgs| msgs.iter().filter_map(|m| m.text("msg")).map(str::to_string).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_placeholder_on_create() {
        let (controller, transport) = setup();

        assert_eq!(controller.state(), ChatState::Connecting);
        assert_eq!(texts(&controller), vec!["Connecting..."]);
        assert!(controller.messages().unwrap().first().unwrap().is_a("SysMessage"));
        assert!(tree::is_disabled(controller.input().unwrap()));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_connected_enables_form_and_joins() {
        let (mut controller, transport) = setup();

        controller.handle(TransportEvent::Connected).unwrap();

        assert!(texts(&controller).is_empty());
        assert!(!tree::is_disabled(controller.input().unwrap()));
        assert!(!tree::is_disabled(controller.button().unwrap()));
        assert_eq!(
            transport.sent(),
            vec![Outbound::Join { username: "alice".to_string(), room: "acme:general".to_string() }]
        );
    }

    #[test]
    fn test_unauthorized() {
        let (mut controller, _) = setup();

        let result = controller.handle(TransportEvent::ConnectError("Unauthorized".to_string()));

        assert!(matches!(result, Err(BindError::TransportAuth(_))));
        assert_eq!(controller.state(), ChatState::Error);
        assert_eq!(texts(&controller), vec!["Unauthorized"]);
        let error = controller.messages().unwrap().first().unwrap();
        assert_eq!(error.text("level"), Some("error"));
        assert!(error.find_class("chat-bubble-error").is_some());
    }

    #[test]
    fn test_error_state_is_terminal() {
        let (mut controller, transport) = setup();
        let _ = controller.handle(TransportEvent::ConnectError("Unauthorized".to_string()));

        controller.handle(TransportEvent::Connected).unwrap();
        controller
            .handle(TransportEvent::Joined { users: vec![user("u1", "alice")], messages: vec![] })
            .unwrap();
        controller.handle(TransportEvent::NewMessage(msg("bob", "late", 1_000))).unwrap();

        assert_eq!(controller.state(), ChatState::Error);
        assert!(tree::is_disabled(controller.input().unwrap()));
        assert!(transport.sent().is_empty());
        assert_eq!(texts(&controller), vec!["Unauthorized"]);
        assert!(controller.users().unwrap().is_empty());
        assert!(!controller.submit("hello"));
    }

    #[test]
    fn test_other_connect_errors_are_ignored() {
        let (mut controller, _) = setup();

        controller.handle(TransportEvent::ConnectError("timeout".to_string())).unwrap();

        assert_eq!(controller.state(), ChatState::Connecting);
        assert_eq!(texts(&controller), vec!["Connecting..."]);
    }

    #[test]
    fn test_joined_orders_and_arms() {
        let (mut controller, _) = setup();
        controller.handle(TransportEvent::Connected).unwrap();

        controller
            .handle(TransportEvent::Joined {
                users: vec![user("u1", "alice"), user("u2", "Bob Smith")],
                messages: vec![msg("bob", "newest", 3_000), msg("alice", "oldest", 1_000)],
            })
            .unwrap();

        assert_eq!(controller.state(), ChatState::Joined);
        assert_eq!(texts(&controller), vec!["newest", "oldest"]);
        let msgs = controller.messages().unwrap();
        assert_eq!(msgs.insert_mode(), InsertMode::Front);
        assert_eq!(controller.trigger().observed(), msgs.last().map(Entity::node));

        let users = controller.users().unwrap();
        assert_eq!(users.get(0).map(Entity::type_name), Some("Myself"));
        let bob = users.get(1).unwrap();
        assert_eq!(tree::text_content(bob.slot("username").unwrap()), "BS");
    }

    #[test]
    fn test_new_message_goes_on_top() {
        let (mut controller, _) = setup();
        controller.handle(TransportEvent::Connected).unwrap();
        controller
            .handle(TransportEvent::Joined { users: vec![], messages: vec![msg("bob", "old", 1_000)] })
            .unwrap();

        controller.handle(TransportEvent::NewMessage(msg("alice", "mine", 2_000))).unwrap();

        assert_eq!(texts(&controller), vec!["mine", "old"]);
        let mine = controller.messages().unwrap().first().unwrap();
        assert!(tree::has_class(mine.node(), "chat-end"));
    }

    #[test]
    fn test_user_left_removes_every_absent_user() {
        let (mut controller, _) = setup();
        controller
            .handle(TransportEvent::Joined {
                users: vec![user("u1", "a"), user("u2", "b"), user("u3", "c")],
                messages: vec![],
            })
            .unwrap();

        controller.handle(TransportEvent::UserLeft(vec![user("u2", "b")])).unwrap();

        let users = controller.users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users.get(0).and_then(|u| u.text("id")), Some("u2"));
        assert!(users.is_mirrored());
    }

    #[test]
    fn test_pagination_round_trip() {
        let (mut controller, transport) = setup();
        controller.handle(TransportEvent::Connected).unwrap();
        controller
            .handle(TransportEvent::Joined {
                users: vec![],
                messages: vec![msg("bob", "b", 2_000), msg("bob", "a", 1_000)],
            })
            .unwrap();
        transport.take();

        let oldest = controller.trigger().observed().unwrap();
        visibility::report_intersection(oldest, false);
        visibility::report_intersection(oldest, true);
        assert_eq!(transport.take(), vec![Outbound::RequestOlder(1_000)]);

        controller
            .handle(TransportEvent::OlderMessages(vec![msg("bob", "z", 500)]))
            .unwrap();
        assert_eq!(texts(&controller), vec!["b", "a", "z"]);
        assert_eq!(controller.messages().unwrap().insert_mode(), InsertMode::Front);
        assert_eq!(
            controller.trigger().observed(),
            controller.messages().unwrap().last().map(Entity::node)
        );

        controller.handle(TransportEvent::OlderMessages(vec![])).unwrap();
        assert!(controller.trigger().is_exhausted());
        assert!(!controller.trigger().is_observing());
    }

    #[test]
    fn test_undecodable_older_batch_does_not_exhaust() {
        reset_registry();
        let config = ChatConfig { username: "alice".to_string(), bind: BindConfig::strict(), ..Default::default() };
        let transport = Rc::new(RecordingTransport::new());
        let mut controller =
            ChatController::new(config, transport.clone(), Rc::new(default_registry())).unwrap();
        controller.handle(TransportEvent::Connected).unwrap();
        controller
            .handle(TransportEvent::Joined { users: vec![], messages: vec![msg("bob", "a", 1_000)] })
            .unwrap();
        let oldest = controller.trigger().observed().unwrap();
        visibility::report_intersection(oldest, false);
        visibility::report_intersection(oldest, true);
        transport.take();

        let garbage = json!({"username": "bob", "msg": "bad", "timestamp": "garbage"})
            .as_object()
            .cloned()
            .unwrap_or_default();
        controller.handle(TransportEvent::OlderMessages(vec![garbage])).unwrap();

        assert_eq!(texts(&controller), vec!["a"]);
        assert!(!controller.trigger().is_exhausted());
        assert!(controller.trigger().is_observing());
        assert_eq!(controller.trigger().observed(), Some(oldest));

        visibility::report_intersection(oldest, false);
        visibility::report_intersection(oldest, true);
        assert_eq!(transport.take(), vec![Outbound::RequestOlder(1_000)]);
    }

    #[test]
    fn test_submit() {
        let (mut controller, transport) = setup();
        assert!(!controller.submit("too early"));

        controller.handle(TransportEvent::Connected).unwrap();
        controller
            .handle(TransportEvent::Joined { users: vec![], messages: vec![] })
            .unwrap();
        transport.take();

        assert!(controller.submit("hello"));
        assert_eq!(transport.take(), vec![Outbound::Message("hello".to_string())]);
        assert_eq!(tree::attribute(controller.input().unwrap(), "value").as_deref(), Some(""));
    }

    #[test]
    fn test_missing_chat_template_is_fatal() {
        reset_registry();
        let transport = Rc::new(RecordingTransport::new());
        let result = ChatController::new(
            ChatConfig::default(),
            transport,
            Rc::new(TemplateRegistry::new()),
        );
        assert!(matches!(result, Err(BindError::TemplateNotFound { .. })));
    }
}
