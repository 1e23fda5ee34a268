//! `write_file`: create or overwrite a file, creating parent directories.

use async_trait::async_trait;
use goclaw_core::error::ToolError;
use goclaw_core::tool::{required_str, Tool, ToolArgs};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file at the specified path. Creates the file if it doesn't exist, overwrites if it does."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the file"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the file"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let path = required_str(&args, "path")?;
        let content = required_str(&args, "content")?;

        let abs_path = std::path::absolute(path).map_err(|e| ToolError::io("Failed to resolve path", e))?;
        if let Some(parent) = abs_path.parent() {
            create_dir_all(parent).await?;
        }
        write_file(&abs_path, content.as_bytes()).await?;

        debug!(path = %abs_path.display(), bytes = content.len(), "Wrote file");
        Ok(format!("Successfully wrote {} bytes to {}", content.len(), path))
    }
}

/// `mkdir -p` with mode 0755 on unix.
pub(crate) async fn create_dir_all(dir: &Path) -> Result<(), ToolError> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder
        .create(dir)
        .await
        .map_err(|e| ToolError::io("Failed to create directory", e))
}

/// Truncate-and-write with mode 0644 on unix.
pub(crate) async fn write_file(path: &Path, data: &[u8]) -> Result<(), ToolError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o644);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| ToolError::io("Failed to write file", e))?;
    file.write_all(data)
        .await
        .map_err(|e| ToolError::io("Failed to write file", e))?;
    file.flush()
        .await
        .map_err(|e| ToolError::io("Failed to write file", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArgs {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn writes_and_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.txt");
        let path_str = path.to_str().unwrap();

        let out = WriteFileTool
            .execute(args(json!({"path": path_str, "content": "hello"})))
            .await
            .unwrap();
        assert_eq!(out, format!("Successfully wrote 5 bytes to {path_str}"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "a much longer original body").unwrap();

        WriteFileTool
            .execute(args(json!({"path": path.to_str().unwrap(), "content": "短"})))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "短");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn new_files_get_0644() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mode.txt");
        WriteFileTool
            .execute(args(json!({"path": path.to_str().unwrap(), "content": ""})))
            .await
            .unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // The process umask may only remove bits.
        assert_eq!(mode & !0o644, 0);
    }

    #[tokio::test]
    async fn content_is_required() {
        let err = WriteFileTool
            .execute(args(json!({"path": "/tmp/x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument(ref k) if k == "content"));
    }
}
