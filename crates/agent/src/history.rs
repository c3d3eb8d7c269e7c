//! Conversion between stored messages and provider conversation turns.

use chrono::{DateTime, Utc};
use kbchat_core::message::Message;
use kbchat_core::provider::ConversationTurn;

/// Project stored history into provider turns, oldest first.
///
/// Timestamps are dropped; role and content are kept as-is. An empty
/// history yields no turns.
pub fn to_provider_format(history: &[Message]) -> Vec<ConversationTurn> {
    history
        .iter()
        .map(|m| ConversationTurn {
            role: m.role,
            content: m.content.clone(),
        })
        .collect()
}

/// Record a turn as a stored message with the given timestamp.
pub fn to_message(turn: ConversationTurn, timestamp: DateTime<Utc>) -> Message {
    Message::new(turn.role, turn.content, timestamp)
}
