//! Default chat markup.

use crate::template::{Blueprint, TemplateRegistry};

/// Avatar bubble showing a user's initials.
pub fn user() -> Blueprint {
    Blueprint::new("div").class("avatar").class("placeholder").child(
        Blueprint::new("div")
            .class("bg-neutral")
            .class("text-neutral-content")
            .class("rounded-full")
            .class("w-8")
            .attr("title", "")
            .child(Blueprint::new("span").display("username")),
    )
}

/// A chat line: header (author and time), bubble, footer.
pub fn message() -> Blueprint {
    Blueprint::new("div")
        .class("chat")
        .class("chat-start")
        .child(
            Blueprint::new("div")
                .class("chat-header")
                .child(Blueprint::new("span").display("username"))
                .child(Blueprint::new("time").class("text-xs").display("timestamp")),
        )
        .child(Blueprint::new("div").class("chat-bubble").display("msg"))
        .child(Blueprint::new("div").class("chat-footer").class("opacity-50"))
}

/// Users strip, message list and a (disabled until connected) input form.
pub fn chat() -> Blueprint {
    Blueprint::new("div")
        .class("chat-widget")
        .child(Blueprint::new("div").class("users").container("users"))
        .child(Blueprint::new("div").class("messages").container("msgs"))
        .child(
            Blueprint::new("form")
                .child(Blueprint::new("input").attr("name", "msg").disabled())
                .child(Blueprint::new("button").text("Send").disabled()),
        )
}

/// Registry with templates for `User`, `Message` and `Chat`.
///
/// Subtypes (`Myself`, `MyMessage`, `SysMessage`) resolve to their parent's
/// template and differ only by decoration.
pub fn default_registry() -> TemplateRegistry {
    TemplateRegistry::new()
        .with("User", user())
        .with("Message", message())
        .with("Chat", chat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_covers_chat_types() {
        let registry = default_registry();

        for chain in [
            &["Myself", "User", "Widget"][..],
            &["SysMessage", "Message", "Widget"][..],
            &["Chat", "Widget"][..],
        ] {
            assert!(registry.resolve(chain).is_ok(), "no template for {chain:?}");
        }
        assert!(registry.resolve(&["Widget"]).is_err());
    }

    #[test]
    fn test_form_starts_disabled() {
        let chat = chat();
        let form = &chat.children[2];
        assert!(form.children.iter().all(|child| child.disabled));
    }
}
