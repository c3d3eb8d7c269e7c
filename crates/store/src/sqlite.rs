//! SQLite backend.
//!
//! Two tables:
//! - `conversations`: one row per conversation id
//! - `messages`: ordered rows keyed by `(conversation_id, seq)`
//!
//! Saving a conversation replaces its rows inside a single transaction.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use kbchat_core::error::StoreError;
use kbchat_core::message::{ConversationMap, Message, Role};
use kbchat_core::store::ChatStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::{debug, info};

/// A chat store backed by a SQLite database file.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::PersistFailure(format!("{}: {e}", parent.display())))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Corrupted {
                location: path.display().to_string(),
                reason: format!("failed to open SQLite: {e}"),
            })?;

        let store = Self::from_pool(pool).await?;
        info!(path = %path.display(), "SQLite chat store initialized");
        Ok(store)
    }

    /// Wrap an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id          TEXT PRIMARY KEY NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| persist(format!("conversations table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                conversation_id TEXT NOT NULL
                    REFERENCES conversations(id) ON DELETE CASCADE,
                seq             INTEGER NOT NULL,
                role            TEXT NOT NULL,
                content         TEXT NOT NULL,
                timestamp       TEXT NOT NULL,
                PRIMARY KEY (conversation_id, seq)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| persist(format!("messages table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    async fn write_conversation(
        tx: &mut Transaction<'_, Sqlite>,
        id: &str,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (id, updated_at) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(format_ts(&Utc::now()))
        .execute(&mut **tx)
        .await
        .map_err(|e| persist(e.to_string()))?;

        sqlx::query("DELETE FROM messages WHERE conversation_id = ?1")
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| persist(e.to_string()))?;

        for (seq, message) in messages.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO messages (conversation_id, seq, role, content, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(id)
            .bind(seq as i64)
            .bind(message.role.as_str())
            .bind(&message.content)
            .bind(format_ts(&message.timestamp))
            .execute(&mut **tx)
            .await
            .map_err(|e| persist(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl ChatStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load_all(&self) -> Result<ConversationMap, StoreError> {
        let ids = sqlx::query("SELECT id FROM conversations")
            .fetch_all(&self.pool)
            .await
            .map_err(read_err)?;

        let mut all = ConversationMap::new();
        for row in &ids {
            all.insert(text_column(row, "id")?, Vec::new());
        }

        let rows = sqlx::query(
            "SELECT conversation_id, role, content, timestamp FROM messages \
             ORDER BY conversation_id, seq",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        for row in &rows {
            let id = text_column(row, "conversation_id")?;
            let message = row_to_message(row)?;
            all.entry(id).or_default().push(message);
        }

        Ok(all)
    }

    async fn save_all(&self, conversations: &ConversationMap) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| persist(e.to_string()))?;

        sqlx::query("DELETE FROM messages")
            .execute(&mut *tx)
            .await
            .map_err(|e| persist(e.to_string()))?;
        sqlx::query("DELETE FROM conversations")
            .execute(&mut *tx)
            .await
            .map_err(|e| persist(e.to_string()))?;

        for (id, messages) in conversations {
            Self::write_conversation(&mut tx, id, messages).await?;
        }

        tx.commit().await.map_err(|e| persist(e.to_string()))
    }

    async fn get(&self, id: &str) -> Result<Vec<Message>, StoreError> {
        let exists = sqlx::query("SELECT 1 FROM conversations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(read_err)?;
        if exists.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let rows = sqlx::query(
            "SELECT role, content, timestamp FROM messages \
             WHERE conversation_id = ?1 ORDER BY seq",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(read_err)?;

        rows.iter().map(row_to_message).collect()
    }

    async fn save(&self, id: &str, messages: &[Message]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| persist(e.to_string()))?;
        Self::write_conversation(&mut tx, id, messages).await?;
        tx.commit().await.map_err(|e| persist(e.to_string()))?;
        debug!(conversation_id = %id, messages = messages.len(), "Conversation saved");
        Ok(())
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, StoreError> {
    let role = text_column(row, "role")?;
    let content = text_column(row, "content")?;
    let timestamp = text_column(row, "timestamp")?;

    let role = match role.as_str() {
        "user" => Role::User,
        "model" | "assistant" => Role::Model,
        other => {
            return Err(StoreError::Corrupted {
                location: "messages.role".into(),
                reason: format!("unknown role {other:?}"),
            });
        }
    };
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| StoreError::Corrupted {
            location: "messages.timestamp".into(),
            reason: e.to_string(),
        })?
        .with_timezone(&Utc);

    Ok(Message::new(role, content, timestamp))
}

fn text_column(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<String, StoreError> {
    row.try_get(column).map_err(|e| StoreError::Corrupted {
        location: format!("column {column}"),
        reason: e.to_string(),
    })
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn persist(reason: String) -> StoreError {
    StoreError::PersistFailure(reason)
}

fn read_err(e: sqlx::Error) -> StoreError {
    StoreError::Corrupted {
        location: "sqlite".into(),
        reason: e.to_string(),
    }
}
