//! Per-conversation directory backend.
//!
//! Each conversation is stored as `<dir>/<id>.json` holding its message
//! array. Saving one conversation touches only its own file, so writers on
//! different ids never contend.

use crate::locks::KeyedLocks;
use async_trait::async_trait;
use kbchat_core::error::StoreError;
use kbchat_core::message::{ConversationMap, Message};
use kbchat_core::store::ChatStore;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const MAX_ID_LEN: usize = 128;

/// A chat store keeping one JSON file per conversation.
pub struct DirectoryStore {
    dir: PathBuf,
    locks: KeyedLocks,
    /// Held by `save_all`, which rewrites the whole directory.
    bulk_lock: Mutex<()>,
}

impl DirectoryStore {
    /// Open the store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::PersistFailure(format!("{}: {e}", dir.display())))?;
        debug!(dir = %dir.display(), "Directory chat store ready");

        Ok(Self {
            dir,
            locks: KeyedLocks::new(),
            bulk_lock: Mutex::new(()),
        })
    }

    fn file_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Conversation ids with a file in the directory, without reading them.
    async fn stored_ids(&self) -> Result<Vec<String>, StoreError> {
        let listing_error = |e: std::io::Error| StoreError::Corrupted {
            location: self.dir.display().to_string(),
            reason: e.to_string(),
        };
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(listing_error)?;

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !is_valid_id(id) {
                warn!(file = %path.display(), "Ignoring file with unexpected name");
                continue;
            }
            ids.push(id.to_string());
        }
        Ok(ids)
    }

    async fn read_file(path: &Path) -> Result<Vec<Message>, StoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Corrupted {
                location: path.display().to_string(),
                reason: e.to_string(),
            })?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupted {
            location: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    async fn write_file(&self, id: &str, messages: &[Message]) -> Result<(), StoreError> {
        let path = self.file_for(id);
        let json = serde_json::to_vec_pretty(messages)
            .map_err(|e| StoreError::PersistFailure(e.to_string()))?;
        crate::write_atomic(&path, &json)
            .await
            .map_err(|e| StoreError::PersistFailure(format!("{}: {e}", path.display())))
    }
}

/// Ids become file names, so only a conservative character set is accepted.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[async_trait]
impl ChatStore for DirectoryStore {
    fn name(&self) -> &str {
        "directory"
    }

    async fn load_all(&self) -> Result<ConversationMap, StoreError> {
        let mut all = ConversationMap::new();
        for id in self.stored_ids().await? {
            let messages = Self::read_file(&self.file_for(&id)).await?;
            all.insert(id, messages);
        }
        Ok(all)
    }

    async fn save_all(&self, conversations: &ConversationMap) -> Result<(), StoreError> {
        let _bulk = self.bulk_lock.lock().await;

        if let Some(bad) = conversations.keys().find(|id| !is_valid_id(id)) {
            return Err(StoreError::PersistFailure(format!(
                "invalid conversation id: {bad:?}"
            )));
        }

        // Stale files are found by name alone so unreadable ones are dropped too.
        let existing = self.stored_ids().await?;
        for id in existing.iter().filter(|id| !conversations.contains_key(*id)) {
            let _guard = self.locks.lock(id).await;
            tokio::fs::remove_file(self.file_for(id))
                .await
                .map_err(|e| StoreError::PersistFailure(e.to_string()))?;
        }

        for (id, messages) in conversations {
            let _guard = self.locks.lock(id).await;
            self.write_file(id, messages).await?;
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Vec<Message>, StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let path = self.file_for(id);
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::Corrupted {
                location: path.display().to_string(),
                reason: e.to_string(),
            })?;
        if !exists {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::read_file(&path).await
    }

    async fn save(&self, id: &str, messages: &[Message]) -> Result<(), StoreError> {
        if !is_valid_id(id) {
            return Err(StoreError::PersistFailure(format!(
                "invalid conversation id: {id:?}"
            )));
        }
        let _guard = self.locks.lock(id).await;
        self.write_file(id, messages).await
    }
}
