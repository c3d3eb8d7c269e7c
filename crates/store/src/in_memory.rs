//! In-memory chat store. Nothing survives a restart; used in tests and demos.

use async_trait::async_trait;
use kbchat_core::error::StoreError;
use kbchat_core::message::{ConversationMap, Message};
use kbchat_core::store::ChatStore;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    conversations: RwLock<ConversationMap>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load_all(&self) -> Result<ConversationMap, StoreError> {
        Ok(self.conversations.read().await.clone())
    }

    async fn save_all(&self, conversations: &ConversationMap) -> Result<(), StoreError> {
        *self.conversations.write().await = conversations.clone();
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Vec<Message>, StoreError> {
        self.conversations
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save(&self, id: &str, messages: &[Message]) -> Result<(), StoreError> {
        self.conversations
            .write()
            .await
            .insert(id.to_string(), messages.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbchat_core::message::Role;

    #[tokio::test]
    async fn save_get_roundtrip() {
        let store = InMemoryStore::new();
        store.save("c", &[Message::user("hi")]).await.unwrap();

        let msgs = store.get("c").await.unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, Role::User);
        assert!(matches!(store.get("x").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn save_all_replaces_mapping() {
        let store = InMemoryStore::new();
        store.save("old", &[Message::user("hi")]).await.unwrap();

        let mut map = ConversationMap::new();
        map.insert("seed".into(), vec![Message::model("hello")]);
        store.save_all(&map).await.unwrap();

        assert!(store.contains("seed").await.unwrap());
        assert!(!store.contains("old").await.unwrap());
    }
}
