//! SQLite conversation store.
//!
//! One table holds every session's messages:
//!
//! ```sql
//! messages(id INTEGER PRIMARY KEY AUTOINCREMENT, session_id, role, content, timestamp)
//! ```
//!
//! with an index on `(session_id, timestamp)`. Timestamps are written as
//! fixed-width RFC 3339 text from a [`MonotonicClock`], so ordering by the
//! column is ordering by insertion.

use crate::clock::{format_timestamp, parse_timestamp, MonotonicClock};
use async_trait::async_trait;
use goclaw_core::error::MemoryError;
use goclaw_core::memory::{ConversationStore, DEFAULT_SESSION};
use goclaw_core::message::{Role, StoredMessage};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A durable conversation log backed by a SQLite file.
pub struct SqliteStore {
    pool: SqlitePool,
    session_id: String,
    clock: MonotonicClock,
}

impl SqliteStore {
    /// Open (or create) the database at `path` for the default session.
    ///
    /// `path` is a plain file path, or a `sqlite:` URL such as
    /// `sqlite::memory:` for an ephemeral database (useful for tests).
    pub async fn open(path: &str) -> Result<Self, MemoryError> {
        Self::open_session(path, DEFAULT_SESSION).await
    }

    /// Open the database scoped to a specific session id.
    pub async fn open_session(path: &str, session_id: &str) -> Result<Self, MemoryError> {
        let in_memory = path.contains(":memory:");
        let options = if path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(path)
                .map_err(|e| MemoryError::Storage(format!("Invalid SQLite path: {e}")))?
        } else {
            SqliteConnectOptions::new().filename(path)
        };
        let options = options
            .create_if_missing(true)
            .journal_mode(if in_memory { SqliteJournalMode::Memory } else { SqliteJournalMode::Wal })
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .connect_with(options)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to open SQLite: {e}")))?;

        let mut store = Self {
            pool,
            session_id: session_id.to_string(),
            clock: MonotonicClock::new(),
        };
        store.run_migrations().await?;

        let newest = store.newest_timestamp().await?;
        store.clock = MonotonicClock::starting_after(newest);

        info!(path, session = session_id, "Conversation store opened");
        Ok(store)
    }

    /// Create the messages table and its index. Idempotent.
    async fn run_migrations(&self) -> Result<(), MemoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id  TEXT NOT NULL,
                role        TEXT NOT NULL,
                content     TEXT NOT NULL,
                timestamp   DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_session_timestamp ON messages(session_id, timestamp)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::MigrationFailed(format!("session index: {e}")))?;

        Ok(())
    }

    async fn newest_timestamp(&self) -> Result<Option<chrono::DateTime<chrono::Utc>>, MemoryError> {
        let row = sqlx::query("SELECT MAX(timestamp) AS ts FROM messages WHERE session_id = ?")
            .bind(&self.session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;

        let raw: Option<String> = row
            .try_get("ts")
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;
        Ok(raw.as_deref().and_then(parse_timestamp))
    }
}

/// Negative LIMIT means "no limit" in SQLite.
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX)).unwrap_or(-1)
}

fn row_to_message(row: &SqliteRow) -> Result<StoredMessage, MemoryError> {
    let get_err = |e: sqlx::Error| MemoryError::QueryFailed(e.to_string());

    let role_str: String = row.try_get("role").map_err(get_err)?;
    let role = Role::from_str(&role_str).map_err(MemoryError::QueryFailed)?;

    let raw_ts: String = row.try_get("timestamp").map_err(get_err)?;
    let timestamp = parse_timestamp(&raw_ts)
        .ok_or_else(|| MemoryError::QueryFailed(format!("Unreadable timestamp '{raw_ts}'")))?;

    Ok(StoredMessage {
        id: row.try_get("id").map_err(get_err)?,
        session_id: row.try_get("session_id").map_err(get_err)?,
        role,
        content: row.try_get("content").map_err(get_err)?,
        timestamp,
    })
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn append(&self, role: Role, content: &str) -> Result<StoredMessage, MemoryError> {
        let timestamp = self.clock.next().await;

        let result = sqlx::query(
            "INSERT INTO messages (session_id, role, content, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(&self.session_id)
        .bind(role.as_str())
        .bind(content)
        .bind(format_timestamp(&timestamp))
        .execute(&self.pool)
        .await
        .map_err(|e| MemoryError::Storage(format!("Failed to append message: {e}")))?;

        let id = result.last_insert_rowid();
        debug!(id, role = %role, "Appended message");

        Ok(StoredMessage {
            id,
            session_id: self.session_id.clone(),
            role,
            content: content.to_string(),
            timestamp,
        })
    }

    async fn history(&self, limit: Option<usize>) -> Result<Vec<StoredMessage>, MemoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, role, content, timestamp
            FROM messages
            WHERE session_id = ?
            ORDER BY timestamp ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(&self.session_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(row_to_message).collect()
    }

    async fn recent(&self, limit: Option<usize>) -> Result<Vec<StoredMessage>, MemoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, session_id, role, content, timestamp FROM (
                SELECT id, session_id, role, content, timestamp
                FROM messages
                WHERE session_id = ?
                ORDER BY timestamp DESC, id DESC
                LIMIT ?
            )
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(&self.session_id)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(row_to_message).collect()
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM messages WHERE session_id = ?")
            .bind(&self.session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| MemoryError::QueryFailed(e.to_string()))?;
        Ok(count as usize)
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE session_id = ?")
            .bind(&self.session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to clear history: {e}")))?;

        debug!(deleted = result.rows_affected(), "Cleared session history");
        Ok(())
    }

    async fn close(&self) -> Result<(), MemoryError> {
        self.pool.close().await;
        info!(session = %self.session_id, "Conversation store closed");
        Ok(())
    }
}
