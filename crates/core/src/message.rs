//! Message and conversation domain types.
//!
//! These are the value objects that flow through the whole service:
//! a question arrives at the gateway → the session manager loads the
//! conversation → the provider answers → two messages are appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Wire value a caller sends to start a fresh conversation.
pub const NEW_CONVERSATION: &str = "New";

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which conversation a chat request addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChatTarget {
    /// Start a new conversation; an id is generated on the first turn.
    #[default]
    New,
    /// Continue a stored conversation.
    Existing(ConversationId),
}

impl ChatTarget {
    /// Parse the wire form: `"New"` starts a conversation, anything else
    /// names an existing one.
    pub fn parse(raw: &str) -> Self {
        if raw == NEW_CONVERSATION {
            ChatTarget::New
        } else {
            ChatTarget::Existing(ConversationId::from(raw))
        }
    }
}

impl From<&str> for ChatTarget {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// The author of a stored message.
///
/// `model` is the canonical label for generated turns. Older stores wrote
/// `assistant`, which is still accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions
    User,
    /// The language model
    #[serde(alias = "assistant")]
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// When the message was recorded (RFC 3339 on disk)
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }

    /// Create a user message stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, Utc::now())
    }

    /// Create a model message stamped now.
    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content, Utc::now())
    }
}

/// Every stored conversation, keyed by conversation id.
pub type ConversationMap = BTreeMap<String, Vec<Message>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, agent!");
    }

    #[test]
    fn message_serializes_with_lowercase_role() {
        let ts = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let msg = Message::new(Role::Model, "Eldoria", ts);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "model");
        assert_eq!(json["content"], "Eldoria");
        assert_eq!(json["timestamp"], "2026-01-02T03:04:05Z");
    }

    #[test]
    fn legacy_assistant_label_reads_as_model() {
        let msg: Message = serde_json::from_str(
            r#"{"role":"assistant","content":"hi","timestamp":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(msg.role, Role::Model);
        // Written back with the canonical label
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""role":"model""#));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let parsed = serde_json::from_str::<Message>(
            r#"{"role":"system","content":"x","timestamp":"2026-01-01T00:00:00Z"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let parsed = serde_json::from_str::<Message>(
            r#"{"role":"user","content":"x","timestamp":"yesterday"}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn chat_target_parsing() {
        assert_eq!(ChatTarget::parse("New"), ChatTarget::New);
        assert_eq!(
            ChatTarget::parse("abc-123"),
            ChatTarget::Existing(ConversationId::from("abc-123"))
        );
        // The sentinel is case-sensitive
        assert!(matches!(ChatTarget::parse("new"), ChatTarget::Existing(_)));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = ConversationId::new();
        let b = ConversationId::new();
        assert_ne!(a, b);
        assert_ne!(a.as_str(), NEW_CONVERSATION);
    }
}
