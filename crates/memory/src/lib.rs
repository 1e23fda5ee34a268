//! Conversation store implementations for GoClaw.

pub mod clock;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use clock::MonotonicClock;
pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
