//! Memory-file tools: `memory_search`, `memory_get` and `update_memory`.
//!
//! All three operate on `<workspace>/memory/`, which holds the long-term
//! `MEMORY.md` and saved conversations under `conversations/`.

use crate::file_write::create_dir_all;
use async_trait::async_trait;
use goclaw_core::error::ToolError;
use goclaw_core::tool::{optional_str, required_str, Tool, ToolArgs};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const MEMORY_DIR: &str = "memory";
pub const MEMORY_FILE: &str = "MEMORY.md";
pub const CONVERSATIONS_DIR: &str = "conversations";

const DEFAULT_SECTION: &str = "其他";

fn memory_dir(workspace: &Path) -> PathBuf {
    workspace.join(MEMORY_DIR)
}

/// Case-insensitive substring search across the memory files.
pub struct MemorySearchTool {
    workspace: PathBuf,
}

impl MemorySearchTool {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self { workspace: workspace.into() }
    }

    /// Names of matching files, relative to the memory directory.
    async fn search(&self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        let matches = |text: &str| text.to_lowercase().contains(&needle);
        let dir = memory_dir(&self.workspace);
        let mut hits = Vec::new();

        if let Ok(content) = tokio::fs::read_to_string(dir.join(MEMORY_FILE)).await {
            if matches(&content) {
                hits.push(MEMORY_FILE.to_string());
            }
        }

        let conversations = dir.join(CONVERSATIONS_DIR);
        let mut names = Vec::new();
        if let Ok(mut reader) = tokio::fs::read_dir(&conversations).await {
            while let Ok(Some(entry)) = reader.next_entry().await {
                let path = entry.path();
                let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
                if is_file && path.extension().is_some_and(|ext| ext == "md") {
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        names.sort();

        for name in names {
            if let Ok(content) = tokio::fs::read_to_string(conversations.join(&name)).await {
                if matches(&content) {
                    hits.push(format!("{CONVERSATIONS_DIR}/{name}"));
                }
            }
        }

        hits
    }
}

#[async_trait]
impl Tool for MemorySearchTool {
    fn name(&self) -> &str {
        "memory_search"
    }

    fn description(&self) -> &str {
        "在记忆文件中搜索相关信息。搜索 MEMORY.md 和 memory/conversations/*.md"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "搜索关键词或问题"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let query = required_str(&args, "query")?;
        let hits = self.search(query).await;
        debug!(query, hits = hits.len(), "Searched memory files");

        if hits.is_empty() {
            return Ok(format!("未找到关于 '{query}' 的记忆"));
        }

        let list: Vec<String> = hits.iter().map(|h| format!("- {h}")).collect();
        Ok(format!("找到 {} 条相关记忆：\n{}", hits.len(), list.join("\n")))
    }
}

/// Read one file from the memory directory.
pub struct MemoryGetTool {
    workspace: PathBuf,
}

impl MemoryGetTool {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self { workspace: workspace.into() }
    }
}

#[async_trait]
impl Tool for MemoryGetTool {
    fn name(&self) -> &str {
        "memory_get"
    }

    fn description(&self) -> &str {
        "读取指定记忆文件的完整内容"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "文件名，例如 MEMORY.md 或 conversations/xxx.md"
                }
            },
            "required": ["filename"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let filename = required_str(&args, "filename")?;
        let path = memory_dir(&self.workspace).join(filename);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ToolError::io(format!("Failed to read {filename}"), e))
    }
}

/// Append a timestamped section to `MEMORY.md`.
pub struct UpdateMemoryTool {
    workspace: PathBuf,
}

impl UpdateMemoryTool {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self { workspace: workspace.into() }
    }
}

#[async_trait]
impl Tool for UpdateMemoryTool {
    fn name(&self) -> &str {
        "update_memory"
    }

    fn description(&self) -> &str {
        "更新长期记忆文件 MEMORY.md，添加新的重要信息"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "要添加的内容"
                },
                "section": {
                    "type": "string",
                    "description": "目标章节（可选），例如：用户偏好、重要事项"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let content = required_str(&args, "content")?;
        let section = optional_str(&args, "section")
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SECTION);

        let dir = memory_dir(&self.workspace);
        create_dir_all(&dir).await?;

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!("\n## {section}\n\n**时间**: {timestamp}\n\n{content}\n");

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(MEMORY_FILE))
            .await
            .map_err(|e| ToolError::io("Failed to write MEMORY.md", e))?;
        file.write_all(entry.as_bytes())
            .await
            .map_err(|e| ToolError::io("Failed to write MEMORY.md", e))?;
        file.flush()
            .await
            .map_err(|e| ToolError::io("Failed to write MEMORY.md", e))?;

        debug!(section, "Updated MEMORY.md");
        Ok(format!("✓ 已更新 MEMORY.md [{section}]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArgs {
        serde_json::from_value(value).unwrap()
    }

    fn workspace_with_memory() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let memory = dir.path().join("memory");
        std::fs::create_dir_all(memory.join("conversations")).unwrap();
        std::fs::write(memory.join("MEMORY.md"), "# Memory\n\nUser likes Rust.\n").unwrap();
        std::fs::write(memory.join("conversations/20240101-090000.md"), "talked about rust traits").unwrap();
        std::fs::write(memory.join("conversations/20240102-090000.md"), "talked about cooking").unwrap();
        std::fs::write(memory.join("conversations/notes.txt"), "rust, but not markdown").unwrap();
        dir
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_files() {
        let dir = workspace_with_memory();
        let tool = MemorySearchTool::new(dir.path());
        let out = tool.execute(args(json!({"query": "RUST"}))).await.unwrap();
        assert_eq!(
            out,
            "找到 2 条相关记忆：\n- MEMORY.md\n- conversations/20240101-090000.md"
        );
    }

    #[tokio::test]
    async fn search_reports_no_match() {
        let dir = workspace_with_memory();
        let tool = MemorySearchTool::new(dir.path());
        let out = tool.execute(args(json!({"query": "golang"}))).await.unwrap();
        assert_eq!(out, "未找到关于 'golang' 的记忆");
    }

    #[tokio::test]
    async fn search_tolerates_missing_memory_dir() {
        let dir = tempfile::tempdir().unwrap();
        let tool = MemorySearchTool::new(dir.path());
        let out = tool.execute(args(json!({"query": "x"}))).await.unwrap();
        assert!(out.starts_with("未找到"));
    }

    #[tokio::test]
    async fn search_hits_feed_memory_get() {
        let dir = workspace_with_memory();
        let get = MemoryGetTool::new(dir.path());
        let out = get
            .execute(args(json!({"filename": "conversations/20240102-090000.md"})))
            .await
            .unwrap();
        assert_eq!(out, "talked about cooking");
    }

    #[tokio::test]
    async fn get_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let get = MemoryGetTool::new(dir.path());
        let err = get.execute(args(json!({"filename": "nope.md"}))).await.unwrap_err();
        assert!(err.to_string().contains("nope.md"));
    }

    #[tokio::test]
    async fn update_appends_section_block() {
        let dir = tempfile::tempdir().unwrap();
        let tool = UpdateMemoryTool::new(dir.path());

        let out = tool
            .execute(args(json!({"content": "Prefers tabs", "section": "用户偏好"})))
            .await
            .unwrap();
        assert_eq!(out, "✓ 已更新 MEMORY.md [用户偏好]");

        let out = tool.execute(args(json!({"content": "Second note"}))).await.unwrap();
        assert_eq!(out, "✓ 已更新 MEMORY.md [其他]");

        let body = std::fs::read_to_string(dir.path().join("memory/MEMORY.md")).unwrap();
        assert!(body.starts_with("\n## 用户偏好\n\n**时间**: "));
        assert!(body.contains("\n\nPrefers tabs\n"));
        assert!(body.contains("\n## 其他\n\n**时间**: "));
        assert!(body.ends_with("\n\nSecond note\n"));
    }

    #[tokio::test]
    async fn update_requires_content() {
        let dir = tempfile::tempdir().unwrap();
        let err = UpdateMemoryTool::new(dir.path()).execute(ToolArgs::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument(ref k) if k == "content"));
    }
}
