//! Built-in tool implementations for GoClaw.
//!
//! Tools give the agent the ability to interact with the world: read and
//! write files, list directories, run commands, and keep long-term notes in
//! the workspace memory files.

pub mod conversation;
pub mod exec_command;
pub mod file_read;
pub mod file_write;
pub mod list_dir;
pub mod memory_files;

use goclaw_core::memory::ConversationStore;
use goclaw_core::tool::ToolRegistry;
use std::path::Path;
use std::sync::Arc;

pub use conversation::{save_conversation, SaveConversationTool};
pub use exec_command::ExecCommandTool;
pub use file_read::ReadFileTool;
pub use file_write::WriteFileTool;
pub use list_dir::ListDirTool;
pub use memory_files::{MemoryGetTool, MemorySearchTool, UpdateMemoryTool};

/// Create a registry with every built-in tool.
///
/// The memory tools are rooted at `workspace`; `save_conversation` exports
/// from `store`.
pub fn default_registry(workspace: &Path, store: Arc<dyn ConversationStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ReadFileTool));
    registry.register(Box::new(WriteFileTool));
    registry.register(Box::new(ListDirTool));
    registry.register(Box::new(ExecCommandTool));
    registry.register(Box::new(MemorySearchTool::new(workspace)));
    registry.register(Box::new(MemoryGetTool::new(workspace)));
    registry.register(Box::new(UpdateMemoryTool::new(workspace)));
    registry.register(Box::new(SaveConversationTool::new(workspace, store)));
    registry
}
