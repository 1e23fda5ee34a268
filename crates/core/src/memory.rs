//! Conversation store contract: the durable log of a chat session.
//!
//! The store is append-only from the agent's point of view: rows are written
//! once, read back chronologically, and only ever removed wholesale by
//! [`ConversationStore::clear`].

use async_trait::async_trait;
use serde::Deserialize;
use crate::error::MemoryError;
use crate::message::{ChatMessage, Role, StoredMessage};

/// The only session a process ever writes to.
pub const DEFAULT_SESSION: &str = "default";

/// Shape accepted by [`ConversationStore::import_json`]; other fields are ignored.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    role: Role,
    #[serde(default)]
    content: String,
}

/// The core conversation store trait.
///
/// Implementations: SQLite (durable) and in-process (tests, throwaway runs).
/// All operations are scoped to the store's session.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append a row stamped with the current time.
    async fn append(&self, role: Role, content: &str) -> std::result::Result<StoredMessage, MemoryError>;

    /// The oldest `limit` rows, ascending. `None` returns every row.
    async fn history(&self, limit: Option<usize>) -> std::result::Result<Vec<StoredMessage>, MemoryError>;

    /// The newest `limit` rows, still in ascending order. `None` returns every row.
    async fn recent(&self, limit: Option<usize>) -> std::result::Result<Vec<StoredMessage>, MemoryError>;

    /// Number of rows in the session.
    async fn count(&self) -> std::result::Result<usize, MemoryError>;

    /// Delete every row in the session.
    async fn clear(&self) -> std::result::Result<(), MemoryError>;

    /// Release the backing handle. Later operations fail.
    async fn close(&self) -> std::result::Result<(), MemoryError>;

    /// Serialise every row of the session as a pretty-printed JSON array.
    async fn export_json(&self) -> std::result::Result<String, MemoryError> {
        let rows = self.history(None).await?;
        serde_json::to_string_pretty(&rows).map_err(|e| MemoryError::Storage(e.to_string()))
    }

    /// Append every `{role, content}` object of a JSON array, in array order.
    ///
    /// Ids and timestamps in the input are ignored; the store assigns fresh ones.
    /// The whole input is validated before anything is written.
    async fn import_json(&self, data: &[u8]) -> std::result::Result<usize, MemoryError> {
        let records: Vec<ImportRecord> =
            serde_json::from_slice(data).map_err(|e| MemoryError::Import(e.to_string()))?;

        for record in &records {
            self.append(record.role, &record.content).await?;
        }
        Ok(records.len())
    }

    /// The most recent `limit` rows as plain `{role, content}` chat messages.
    async fn to_provider_format(&self, limit: Option<usize>) -> std::result::Result<Vec<ChatMessage>, MemoryError> {
        let rows = self.recent(limit).await?;
        Ok(rows.iter().map(ChatMessage::from).collect())
    }
}
