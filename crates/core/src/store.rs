//! ChatStore trait: persistence of conversation transcripts.
//!
//! A store is a mapping from conversation id to an ordered list of
//! [`Message`]s. The mapping is the single source of truth: the session
//! manager reads a copy, appends to it, and writes the whole list back.

use async_trait::async_trait;
use crate::error::StoreError;
use crate::message::{ConversationMap, Message};

/// The core ChatStore trait.
///
/// Implementations: whole-file JSON, per-conversation directory, SQLite,
/// in-memory (for testing).
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// The backend name (e.g., "json_file", "sqlite").
    fn name(&self) -> &str;

    /// Read every conversation.
    ///
    /// Fails with [`StoreError::Corrupted`] when the persisted data cannot be
    /// read or decoded.
    async fn load_all(&self) -> Result<ConversationMap, StoreError>;

    /// Replace the entire persisted mapping with `conversations`.
    async fn save_all(&self, conversations: &ConversationMap) -> Result<(), StoreError>;

    /// Read one conversation. Fails with [`StoreError::NotFound`] if absent.
    async fn get(&self, id: &str) -> Result<Vec<Message>, StoreError> {
        let mut all = self.load_all().await?;
        all.remove(id).ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Set `id` to `messages`, creating the conversation if needed.
    ///
    /// The default is a read-modify-write of the full mapping. Backends with
    /// key-addressable storage override it to touch only one conversation.
    async fn save(&self, id: &str, messages: &[Message]) -> Result<(), StoreError> {
        let mut all = self.load_all().await?;
        all.insert(id.to_string(), messages.to_vec());
        self.save_all(&all).await
    }

    /// Whether a conversation exists.
    async fn contains(&self, id: &str) -> Result<bool, StoreError> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
