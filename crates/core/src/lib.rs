//! # GoClaw Core
//!
//! Domain types, traits, and error definitions for the GoClaw agent loop.
//! It defines the domain model that the store, tool, provider and agent
//! crates implement against, and keeps its own dependencies to serde,
//! chrono, async-trait and the tokio filesystem API.
//!
//! ## Layout
//!
//! - [`message`]: persisted rows and in-flight chat messages
//! - [`provider`]: the chat-completions request/response model and the [`Provider`] trait
//! - [`tool`]: the [`Tool`] trait and the name-keyed [`ToolRegistry`]
//! - [`memory`]: the [`ConversationStore`] contract
//! - [`context`]: workspace context files and system-prompt assembly

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod memory;
pub mod context;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{ChatMessage, Role, StoredMessage, ToolCall};
pub use provider::{ChatRequest, ChatResponse, Choice, Provider, ToolDefinition, Usage};
pub use tool::{ModelTool, Tool, ToolArgs, ToolRegistry};
pub use memory::{ConversationStore, DEFAULT_SESSION};
pub use context::{ContextFile, ContextLoader};
