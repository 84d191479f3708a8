//! Chat entity types.
//!
//! ```text
//! Widget
//! ├── User ──────── Myself
//! ├── Message ───┬─ MyMessage
//! │              └─ SysMessage
//! └── Chat
//! ```
//!
//! Every type ends in `Widget`, so a registry only needs templates for the
//! types whose markup actually differs.

use std::rc::Rc;

use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::engine::{release_index, tree};
use crate::entity::{Entity, EntityType, Schema};
use crate::types::{FieldKind, FieldValue, Timestamp};

/// The chat type family, shared by the classifier and the controller.
#[derive(Debug, Clone)]
pub struct ChatKinds {
    pub widget: Rc<EntityType>,
    pub user: Rc<EntityType>,
    pub myself: Rc<EntityType>,
    pub message: Rc<EntityType>,
    pub my_message: Rc<EntityType>,
    pub sys_message: Rc<EntityType>,
    pub chat: Rc<EntityType>,
}

impl ChatKinds {
    pub fn new() -> Self {
        let widget = EntityType::new("Widget", Schema::new());

        let user = EntityType::extend(&widget, "User").with_fields(
            Schema::new()
                .field("id", FieldKind::Text)
                .formatted("username", FieldKind::Text, |v| initials(&v.display())),
        );
        let myself = EntityType::extend(&user, "Myself").decorate(decorate_myself);

        let message = EntityType::extend(&widget, "Message")
            .with_fields(
                Schema::new()
                    .field("id", FieldKind::Text)
                    .field("username", FieldKind::Text)
                    .field("msg", FieldKind::Text)
                    .formatted("timestamp", FieldKind::Timestamp, format_message_time),
            )
            .decorate(decorate_message);
        let my_message = EntityType::extend(&message, "MyMessage").decorate(decorate_my_message);
        let sys_message = EntityType::extend(&message, "SysMessage")
            .with_fields(Schema::new().field("level", FieldKind::Text))
            .decorate(decorate_sys_message);

        let chat = EntityType::extend(&widget, "Chat").with_fields(
            Schema::new()
                .field("users", FieldKind::Sequence)
                .field("msgs", FieldKind::Sequence),
        );

        Self {
            widget: widget.into_rc(),
            user: user.into_rc(),
            myself: myself.into_rc(),
            message: message.into_rc(),
            my_message: my_message.into_rc(),
            sys_message: sys_message.into_rc(),
            chat: chat.into_rc(),
        }
    }
}

impl Default for ChatKinds {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Formatters
// =============================================================================

/// First character of every word: `"Ada Lovelace"` → `"AL"`.
pub fn initials(name: &str) -> String {
    name.split(' ').filter_map(|word| word.chars().next()).collect()
}

fn format_message_time(value: &FieldValue) -> String {
    match value.as_timestamp() {
        Some(ts) => format_timestamp(ts, OffsetDateTime::now_utc().date()),
        None => value.display(),
    }
}

/// `HH:MM` for timestamps on `today`, `YYYY-MM-DD HH:MM` otherwise.
pub fn format_timestamp(ts: Timestamp, today: Date) -> String {
    let datetime = ts.datetime();
    let formatted = if datetime.date() == today {
        datetime.format(format_description!("[hour]:[minute]"))
    } else {
        datetime.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
    };
    formatted.unwrap_or_else(|_| ts.to_rfc3339())
}

// =============================================================================
// Decorators
// =============================================================================

fn decorate_myself(entity: &Entity) {
    let background = tree::children(entity.node())
        .into_iter()
        .find(|child| tree::tag(*child) == "div");
    if let Some(bg) = background {
        tree::remove_class(bg, "bg-neutral");
        tree::remove_class(bg, "text-neutral-content");
        tree::add_class(bg, "bg-primary");
        tree::add_class(bg, "text-primary-content");
    }
}

fn decorate_message(entity: &Entity) {
    let time = tree::find_by_tag(entity.node(), "time");
    let millis = entity
        .get("timestamp")
        .and_then(FieldValue::as_timestamp)
        .map(|ts| ts.millis());
    if let (Some(time), Some(millis)) = (time, millis) {
        tree::set_attribute(time, "datetime", &millis.to_string());
    }
}

fn decorate_my_message(entity: &Entity) {
    tree::swap_class(entity.node(), "chat-start", "chat-end");
    if let Some(bubble) = entity.find_class("chat-bubble") {
        tree::add_class(bubble, "chat-bubble-primary");
    }
}

fn decorate_sys_message(entity: &Entity) {
    for class in ["chat-header", "chat-footer"] {
        if let Some(node) = entity.find_class(class) {
            release_index(node);
        }
    }
    tree::swap_class(entity.node(), "chat-start", "chat-end");

    let level_class = match entity.text("level") {
        Some("info") => Some("chat-bubble-info"),
        Some("success") => Some("chat-bubble-success"),
        Some("warning") => Some("chat-bubble-warning"),
        Some("error") => Some("chat-bubble-error"),
        _ => None,
    };
    if let (Some(bubble), Some(class)) = (entity.find_class("chat-bubble"), level_class) {
        tree::add_class(bubble, class);
    }
}
