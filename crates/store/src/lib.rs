//! Chat history storage for kbchat.
//!
//! Backends:
//! - **json_file**: the whole mapping in one JSON file (default)
//! - **directory**: one JSON file per conversation
//! - **sqlite**: SQLite database (feature `sqlite`)
//! - **in_memory**: nothing persisted

pub mod directory;
pub mod in_memory;
pub mod json_file;
pub mod locks;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use directory::DirectoryStore;
pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
pub use locks::KeyedLocks;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use kbchat_config::StoreConfig;
use kbchat_core::error::StoreError;
use kbchat_core::store::ChatStore;
use std::path::Path;
use std::sync::Arc;

/// Open the backend named in `config`.
pub async fn open_from_config(config: &StoreConfig) -> Result<Arc<dyn ChatStore>, StoreError> {
    let store: Arc<dyn ChatStore> = match config.backend.as_str() {
        "json_file" => Arc::new(JsonFileStore::open(&config.path).await?),
        "directory" => Arc::new(DirectoryStore::open(&config.path).await?),
        #[cfg(feature = "sqlite")]
        "sqlite" => Arc::new(SqliteStore::open(&config.path).await?),
        "in_memory" => Arc::new(InMemoryStore::new()),
        other => {
            return Err(StoreError::PersistFailure(format!(
                "unsupported store backend: {other}"
            )));
        }
    };

    tracing::info!(backend = store.name(), path = %config.path.display(), "Chat store opened");
    Ok(store)
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
