//! Conversation export to markdown, and the `save_conversation` tool.
//!
//! Files land in `<workspace>/memory/conversations/` named
//! `YYYYMMDD-HHMMSS[-title].md`, where they are found by `memory_search`.

use crate::file_write::{create_dir_all, write_file};
use crate::memory_files::{CONVERSATIONS_DIR, MEMORY_DIR};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use goclaw_core::error::{Error, ToolError};
use goclaw_core::memory::ConversationStore;
use goclaw_core::message::{Role, StoredMessage};
use goclaw_core::tool::{optional_str, Tool, ToolArgs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const DEFAULT_TITLE: &str = "对话记录";

/// Replace everything but ASCII alphanumerics, `-` and `_` with `-`.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

pub fn conversation_filename(title: Option<&str>, now: &DateTime<Local>) -> String {
    let stamp = now.format("%Y%m%d-%H%M%S");
    match title {
        Some(t) => format!("{stamp}-{}.md", sanitize_title(t)),
        None => format!("{stamp}.md"),
    }
}

/// Render persisted messages as a markdown transcript.
pub fn render_conversation(title: Option<&str>, messages: &[StoredMessage], now: &DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", title.unwrap_or(DEFAULT_TITLE)));
    out.push_str(&format!("**时间**: {}\n", now.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("**消息数**: {}\n\n", messages.len()));
    out.push_str("---\n\n");

    for msg in messages {
        let speaker = if msg.role == Role::User { "用户" } else { "GoClaw" };
        let time = msg.timestamp.with_timezone(&Local).format("%H:%M");
        out.push_str(&format!("### {speaker} [{time}]\n\n"));
        out.push_str(&msg.content);
        out.push_str("\n\n");
    }
    out
}

/// Write the whole session history to a new markdown file and return its path.
pub async fn save_conversation(
    workspace: &Path,
    store: &dyn ConversationStore,
    title: Option<&str>,
) -> Result<PathBuf, Error> {
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    let messages = store.history(None).await?;

    let dir = workspace.join(MEMORY_DIR).join(CONVERSATIONS_DIR);
    create_dir_all(&dir).await?;

    let now = Local::now();
    let path = dir.join(conversation_filename(title, &now));
    write_file(&path, render_conversation(title, &messages, &now).as_bytes()).await?;

    info!(path = %path.display(), messages = messages.len(), "Saved conversation");
    Ok(path)
}

/// Lets the model archive the current conversation.
pub struct SaveConversationTool {
    workspace: PathBuf,
    store: Arc<dyn ConversationStore>,
}

impl SaveConversationTool {
    pub fn new(workspace: impl Into<PathBuf>, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            workspace: workspace.into(),
            store,
        }
    }
}

#[async_trait]
impl Tool for SaveConversationTool {
    fn name(&self) -> &str {
        "save_conversation"
    }

    fn description(&self) -> &str {
        "保存当前对话到 markdown 文件。可提供简短标题用于生成文件名。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": {
                    "type": "string",
                    "description": "对话的简短描述，用于生成文件名（可选）"
                }
            }
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let title = optional_str(&args, "title");
        let path = save_conversation(&self.workspace, self.store.as_ref(), title)
            .await
            .map_err(|e| match e {
                Error::Tool(inner) => inner,
                other => ToolError::Io {
                    context: "Failed to save conversation".into(),
                    reason: other.to_string(),
                },
            })?;
        Ok(format!("对话已保存到 {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use goclaw_memory::InMemoryStore;

    #[test]
    fn titles_are_sanitized() {
        assert_eq!(sanitize_title("Rust traits_101"), "Rust-traits_101");
        assert_eq!(sanitize_title("周末计划!"), "-----");
    }

    #[test]
    fn filenames_carry_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(conversation_filename(None, &now), "20240305-140709.md");
        assert_eq!(conversation_filename(Some("a b"), &now), "20240305-140709-a-b.md");
    }

    #[tokio::test]
    async fn transcript_lists_every_message() {
        let store = InMemoryStore::new();
        store.append(Role::User, "hello").await.unwrap();
        store.append(Role::Assistant, "hi").await.unwrap();
        let messages = store.history(None).await.unwrap();

        let now = Local::now();
        let text = render_conversation(None, &messages, &now);
        assert!(text.starts_with("# 对话记录\n\n**时间**: "));
        assert!(text.contains("**消息数**: 2\n\n---\n\n### 用户 ["));
        assert!(text.contains("]\n\nhello\n\n### GoClaw ["));
        assert!(text.ends_with("]\n\nhi\n\n"));
    }

    #[tokio::test]
    async fn tool_writes_into_conversations_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
        store.append(Role::User, "remember the milk").await.unwrap();

        let tool = SaveConversationTool::new(dir.path(), store);
        let args: ToolArgs = serde_json::from_value(serde_json::json!({"title": "shopping"})).unwrap();
        let out = tool.execute(args).await.unwrap();
        assert!(out.contains("-shopping.md"));

        let saved: Vec<_> = std::fs::read_dir(dir.path().join("memory/conversations"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(saved.len(), 1);
        let body = std::fs::read_to_string(&saved[0]).unwrap();
        assert!(body.starts_with("# shopping\n"));
        assert!(body.contains("remember the milk"));
    }
}
