//! Chat record classification.

use std::rc::Rc;

use serde_json::Value;

use super::kinds::ChatKinds;
use crate::entity::EntityType;
use crate::sequence::EntityFactory;
use crate::types::RawRecord;

/// Picks chat types relative to the local user.
///
/// | collection | record                       | type         |
/// |------------|------------------------------|--------------|
/// | `msgs`     | has `level`                  | `SysMessage` |
/// | `msgs`     | `username` is the local user | `MyMessage`  |
/// | `msgs`     | otherwise                    | `Message`    |
/// | `users`    | `username` is the local user | `Myself`     |
/// | `users`    | otherwise                    | `User`       |
#[derive(Debug, Clone)]
pub struct ChatClassifier {
    username: String,
    kinds: ChatKinds,
}

impl ChatClassifier {
    pub fn new(username: &str, kinds: ChatKinds) -> Self {
        Self {
            username: username.to_string(),
            kinds,
        }
    }

    fn is_self(&self, raw: &RawRecord) -> bool {
        raw.get("username").and_then(Value::as_str) == Some(self.username.as_str())
    }
}

impl EntityFactory for ChatClassifier {
    fn classify(&self, collection: &str, raw: &RawRecord) -> Option<Rc<EntityType>> {
        let ty = match collection {
            "msgs" if raw.contains_key("level") => &self.kinds.sys_message,
            "msgs" if self.is_self(raw) => &self.kinds.my_message,
            "msgs" => &self.kinds.message,
            "users" if self.is_self(raw) => &self.kinds.myself,
            "users" => &self.kinds.user,
            _ => return None,
        };
        Some(ty.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap_or_default()
    }

    fn classify(me: &str, collection: &str, raw: Value) -> Option<String> {
        ChatClassifier::new(me, ChatKinds::new())
            .classify(collection, &record(raw))
            .map(|ty| ty.name().to_string())
    }

    #[test]
    fn test_other_user() {
        let raw = json!({"username": "bob", "msg": "hi"});
        assert_eq!(classify("alice", "msgs", raw.clone()).as_deref(), Some("Message"));
        assert_eq!(classify("alice", "users", raw).as_deref(), Some("User"));
    }

    #[test]
    fn test_self() {
        let raw = json!({"username": "bob", "msg": "hi"});
        assert_eq!(classify("bob", "msgs", raw.clone()).as_deref(), Some("MyMessage"));
        assert_eq!(classify("bob", "users", raw).as_deref(), Some("Myself"));
    }

    #[test]
    fn test_level_wins() {
        let raw = json!({"username": "bob", "msg": "down", "level": "error"});
        assert_eq!(classify("alice", "msgs", raw.clone()).as_deref(), Some("SysMessage"));
        assert_eq!(classify("bob", "msgs", raw).as_deref(), Some("SysMessage"));
    }

    #[test]
    fn test_unknown_collection() {
        assert_eq!(classify("alice", "rooms", json!({"username": "x"})), None);
    }
}
