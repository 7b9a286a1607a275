use serde::{Deserialize, Serialize};

/// Inbound interaction types the platform delivers to the webhook.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum InteractionKind {
    Ping,
    ApplicationCommand,
    Unsupported(u8),
}

impl From<u8> for InteractionKind {
    fn from(value: u8) -> Self {
        match value {
            1 => InteractionKind::Ping,
            2 => InteractionKind::ApplicationCommand,
            other => InteractionKind::Unsupported(other),
        }
    }
}

/// One interaction callback, decoded once at the HTTP boundary. Everything
/// except the type discriminator is optional on the wire.
#[derive(Clone, Debug, Deserialize)]
pub struct Interaction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default)]
    pub data: Option<CommandData>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommandData {
    pub name: String,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Guild membership details; `user` is present on guild interactions.
#[derive(Clone, Debug, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub global_name: Option<String>,
}

impl CommandData {
    /// Looks up a string-typed option value. Non-string values are ignored;
    /// the registered commands only declare string options.
    pub fn string_option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name == name)
            .and_then(|option| option.value.as_ref())
            .and_then(|value| value.as_str())
    }
}

impl Interaction {
    /// Resolves the display name by priority: guild nickname, then global
    /// display name, then username, with a literal fallback. The user object
    /// comes from the member when present, the top level otherwise. Empty
    /// strings fall through to the next candidate.
    pub fn display_name(&self) -> String {
        let member = self.member.as_ref();
        let user = member.and_then(|m| m.user.as_ref()).or(self.user.as_ref());

        member
            .and_then(|m| m.nick.as_deref())
            .filter(|nick| !nick.is_empty())
            .or_else(|| {
                user.and_then(|u| u.global_name.as_deref()).filter(|name| !name.is_empty())
            })
            .or_else(|| user.and_then(|u| u.username.as_deref()).filter(|name| !name.is_empty()))
            .unwrap_or("Unknown")
            .to_string()
    }

    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.name.as_str())
    }
}

pub const RESPONSE_TYPE_PONG: u8 = 1;
pub const RESPONSE_TYPE_CHANNEL_MESSAGE: u8 = 4;

/// Outbound interaction response: `{type, data?: {content}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResponseData {
    pub content: String,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self { kind: RESPONSE_TYPE_PONG, data: None }
    }

    pub fn message(content: impl Into<String>) -> Self {
        Self {
            kind: RESPONSE_TYPE_CHANNEL_MESSAGE,
            data: Some(ResponseData { content: content.into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Interaction, InteractionKind, InteractionResponse};

    fn decode(value: serde_json::Value) -> Interaction {
        serde_json::from_value(value).expect("interaction should decode")
    }

    #[test]
    fn decodes_an_application_command_payload() {
        let interaction = decode(json!({
            "id": "9001",
            "type": 2,
            "data": {
                "name": "work_done",
                "options": [
                    {"name": "task_title", "value": "Fix bug"},
                    {"name": "desc", "value": "parser edge case"}
                ]
            },
            "member": {
                "nick": "Bob",
                "user": {"username": "rob123", "global_name": "robert"}
            }
        }));

        assert_eq!(interaction.kind, InteractionKind::ApplicationCommand);
        assert_eq!(interaction.command_name(), Some("work_done"));
        let data = interaction.data.as_ref().expect("command data");
        assert_eq!(data.string_option("task_title"), Some("Fix bug"));
        assert_eq!(data.string_option("desc"), Some("parser edge case"));
        assert_eq!(data.string_option("missing"), None);
    }

    #[test]
    fn unknown_type_values_decode_as_unsupported() {
        let interaction = decode(json!({"type": 7}));
        assert_eq!(interaction.kind, InteractionKind::Unsupported(7));
        assert!(interaction.data.is_none());
    }

    #[test]
    fn display_name_prefers_nickname_then_global_then_username() {
        let full = decode(json!({
            "type": 2,
            "member": {
                "nick": "Bob",
                "user": {"username": "rob123", "global_name": "robert"}
            }
        }));
        assert_eq!(full.display_name(), "Bob");

        let no_nick = decode(json!({
            "type": 2,
            "member": {"user": {"username": "rob123", "global_name": "robert"}}
        }));
        assert_eq!(no_nick.display_name(), "robert");

        let username_only = decode(json!({
            "type": 2,
            "member": {"user": {"username": "rob123"}}
        }));
        assert_eq!(username_only.display_name(), "rob123");

        let nobody = decode(json!({"type": 2}));
        assert_eq!(nobody.display_name(), "Unknown");
    }

    #[test]
    fn display_name_uses_top_level_user_outside_guilds() {
        let interaction = decode(json!({
            "type": 2,
            "user": {"username": "rob123", "global_name": "robert"}
        }));
        assert_eq!(interaction.display_name(), "robert");
    }

    #[test]
    fn empty_name_fields_fall_through() {
        let interaction = decode(json!({
            "type": 2,
            "member": {
                "nick": "",
                "user": {"username": "rob123", "global_name": ""}
            }
        }));
        assert_eq!(interaction.display_name(), "rob123");
    }

    #[test]
    fn non_string_option_values_are_ignored() {
        let interaction = decode(json!({
            "type": 2,
            "data": {
                "name": "work_done",
                "options": [{"name": "task_title", "value": 42}]
            }
        }));
        let data = interaction.data.as_ref().expect("command data");
        assert_eq!(data.string_option("task_title"), None);
    }

    #[test]
    fn pong_serializes_without_a_data_key() {
        let encoded =
            serde_json::to_value(InteractionResponse::pong()).expect("pong should encode");
        assert_eq!(encoded, json!({"type": 1}));
    }

    #[test]
    fn messages_serialize_with_content() {
        let encoded = serde_json::to_value(InteractionResponse::message("hello"))
            .expect("message should encode");
        assert_eq!(encoded, json!({"type": 4, "data": {"content": "hello"}}));
    }
}
