//! Whole-file JSON backend.
//!
//! The entire mapping lives in one JSON object keyed by conversation id:
//!
//! ```json
//! { "3f2a…": [ { "role": "user", "content": "Hi", "timestamp": "2025-01-01T00:00:00Z" } ] }
//! ```
//!
//! Every write replaces the file through a temp file and rename, so readers
//! never observe a half-written document. Writers inside this process are
//! serialized by an async lock held across the read-modify-write.

use async_trait::async_trait;
use kbchat_core::error::StoreError;
use kbchat_core::message::{ConversationMap, Message};
use kbchat_core::store::ChatStore;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A chat store backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating it with an empty mapping if absent.
    ///
    /// An existing file is left untouched, even if it is unreadable: that
    /// surfaces as [`StoreError::Corrupted`] on the first read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| persist_error(&path, e))?;
        if exists {
            debug!(path = %path.display(), "Using existing chat history file");
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| persist_error(&path, e))?;
            }
            crate::write_atomic(&path, b"{}")
                .await
                .map_err(|e| persist_error(&path, e))?;
            info!(path = %path.display(), "Created empty chat history file");
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<ConversationMap, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| corrupted(&self.path, e))?;
        serde_json::from_str(&raw).map_err(|e| corrupted(&self.path, e))
    }

    async fn write_map(&self, conversations: &ConversationMap) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(conversations)
            .map_err(|e| StoreError::PersistFailure(e.to_string()))?;
        crate::write_atomic(&self.path, &json)
            .await
            .map_err(|e| persist_error(&self.path, e))?;
        debug!(
            path = %self.path.display(),
            conversations = conversations.len(),
            "Chat history flushed"
        );
        Ok(())
    }
}

#[async_trait]
impl ChatStore for JsonFileStore {
    fn name(&self) -> &str {
        "json_file"
    }

    async fn load_all(&self) -> Result<ConversationMap, StoreError> {
        self.read_map().await
    }

    async fn save_all(&self, conversations: &ConversationMap) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_map(conversations).await
    }

    async fn save(&self, id: &str, messages: &[Message]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut all = self.read_map().await?;
        all.insert(id.to_string(), messages.to_vec());
        self.write_map(&all).await
    }
}

fn corrupted(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupted {
        location: path.display().to_string(),
        reason: err.to_string(),
    }
}

fn persist_error(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::PersistFailure(format!("{}: {err}", path.display()))
}
