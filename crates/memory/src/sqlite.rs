//! SQLite backend: one row per message.
//!
//! Storage location: `<project>/.codewright/memory.db`
//!
//! Schema:
//! `messages(id INTEGER PRIMARY KEY AUTOINCREMENT, role, content, timestamp, metadata)`
//! with `id` order as the conversation order. Appends insert a single row;
//! a full rewrite replaces the table inside one transaction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use codewright_core::error::MemoryError;
use codewright_core::{Message, Role};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

pub struct SqliteBackend {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteBackend {
    /// Open (or create) the database at `path`.
    pub async fn new(path: &Path) -> Result<Self, MemoryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MemoryError::Storage(format!("Failed to create memory directory: {e}")))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let backend = Self {
            pool,
            path: path.to_path_buf(),
        };
        backend.run_migrations().await?;
        info!("SQLite memory backend initialized at {}", path.display());
        Ok(backend)
    }

    /// `<state_dir>/memory.db`
    pub async fn in_dir(state_dir: &Path) -> Result<Self, MemoryError> {
        Self::new(&state_dir.join("memory.db")).await
    }

    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                role      TEXT NOT NULL,
                content   TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                metadata  TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("messages table: {e}")))?;

        Ok(())
    }

    fn encode_metadata(message: &Message) -> String {
        serde_json::to_string(&message.metadata).unwrap_or_else(|_| "{}".into())
    }

    fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message, MemoryError> {
        let role: String = row
            .try_get("role")
            .map_err(|e| MemoryError::Storage(format!("role column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| MemoryError::Storage(format!("content column: {e}")))?;
        let timestamp: String = row
            .try_get("timestamp")
            .map_err(|e| MemoryError::Storage(format!("timestamp column: {e}")))?;
        let metadata: String = row.try_get("metadata").unwrap_or_else(|_| "{}".into());

        let role: Role = role.parse().map_err(MemoryError::Storage)?;

        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let metadata = serde_json::from_str(&metadata).unwrap_or_default();

        Ok(Message {
            role,
            content,
            timestamp,
            metadata,
        })
    }
}

#[async_trait]
impl crate::backend::ConversationBackend for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }

    async fn load(&self) -> Result<Vec<Message>, MemoryError> {
        let rows = sqlx::query("SELECT role, content, timestamp, metadata FROM messages ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("Load failed: {e}")))?;

        let messages = rows
            .iter()
            .filter_map(|row| match Self::row_to_message(row) {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable memory row");
                    None
                }
            })
            .collect();

        Ok(messages)
    }

    async fn append(&self, added: &Message, _log: &[Message], evicted: usize) -> Result<(), MemoryError> {
        sqlx::query("INSERT INTO messages (role, content, timestamp, metadata) VALUES (?, ?, ?, ?)")
            .bind(added.role.as_str())
            .bind(&added.content)
            .bind(added.timestamp.to_rfc3339())
            .bind(Self::encode_metadata(added))
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("Insert failed: {e}")))?;

        if evicted > 0 {
            sqlx::query("DELETE FROM messages WHERE id IN (SELECT id FROM messages ORDER BY id ASC LIMIT ?)")
                .bind(evicted as i64)
                .execute(&self.pool)
                .await
                .map_err(|e| MemoryError::Storage(format!("Eviction failed: {e}")))?;
        }

        Ok(())
    }

    async fn rewrite(&self, log: &[Message]) -> Result<(), MemoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MemoryError::Storage(format!("Begin failed: {e}")))?;

        sqlx::query("DELETE FROM messages")
            .execute(&mut *tx)
            .await
            .map_err(|e| MemoryError::Storage(format!("Delete failed: {e}")))?;

        for message in log {
            sqlx::query("INSERT INTO messages (role, content, timestamp, metadata) VALUES (?, ?, ?, ?)")
                .bind(message.role.as_str())
                .bind(&message.content)
                .bind(message.timestamp.to_rfc3339())
                .bind(Self::encode_metadata(message))
                .execute(&mut *tx)
                .await
                .map_err(|e| MemoryError::Storage(format!("Insert failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| MemoryError::Storage(format!("Commit failed: {e}")))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        sqlx::query("DELETE FROM messages")
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("Clear failed: {e}")))?;
        Ok(())
    }
}
