//! In-memory store: useful for testing and throwaway sessions.

use crate::clock::MonotonicClock;
use async_trait::async_trait;
use goclaw_core::error::MemoryError;
use goclaw_core::memory::{ConversationStore, DEFAULT_SESSION};
use goclaw_core::message::{Role, StoredMessage};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A conversation store that keeps rows in a Vec.
/// Nothing survives the process.
pub struct InMemoryStore {
    rows: RwLock<Vec<StoredMessage>>,
    next_id: RwLock<i64>,
    clock: MonotonicClock,
    closed: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
            next_id: RwLock::new(1),
            clock: MonotonicClock::new(),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), MemoryError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(MemoryError::Storage("store is closed".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn append(&self, role: Role, content: &str) -> Result<StoredMessage, MemoryError> {
        self.ensure_open()?;

        let mut next_id = self.next_id.write().await;
        let message = StoredMessage {
            id: *next_id,
            session_id: DEFAULT_SESSION.to_string(),
            role,
            content: content.to_string(),
            timestamp: self.clock.next().await,
        };
        *next_id += 1;

        self.rows.write().await.push(message.clone());
        Ok(message)
    }

    async fn history(&self, limit: Option<usize>) -> Result<Vec<StoredMessage>, MemoryError> {
        self.ensure_open()?;
        let rows = self.rows.read().await;
        let take = limit.unwrap_or(rows.len());
        Ok(rows.iter().take(take).cloned().collect())
    }

    async fn recent(&self, limit: Option<usize>) -> Result<Vec<StoredMessage>, MemoryError> {
        self.ensure_open()?;
        let rows = self.rows.read().await;
        let skip = limit.map(|n| rows.len().saturating_sub(n)).unwrap_or(0);
        Ok(rows[skip..].to_vec())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        self.ensure_open()?;
        Ok(self.rows.read().await.len())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.ensure_open()?;
        self.rows.write().await.clear();
        Ok(())
    }

    async fn close(&self) -> Result<(), MemoryError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
