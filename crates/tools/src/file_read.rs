//! `read_file`: return the full contents of a file.

use async_trait::async_trait;
use goclaw_core::error::ToolError;
use goclaw_core::tool::{required_str, Tool, ToolArgs};

pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the content of a file at the specified path"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the file"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let path = required_str(&args, "path")?;
        let abs_path = std::path::absolute(path).map_err(|e| ToolError::io("Failed to resolve path", e))?;

        let exists = tokio::fs::try_exists(&abs_path)
            .await
            .map_err(|e| ToolError::io("Failed to stat file", e))?;
        if !exists {
            return Err(ToolError::NotFound(path.to_string()));
        }

        let bytes = tokio::fs::read(&abs_path)
            .await
            .map_err(|e| ToolError::io("Failed to read file", e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArgs {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "X").unwrap();

        let out = ReadFileTool
            .execute(args(json!({"path": path.to_str().unwrap()})))
            .await
            .unwrap();
        assert_eq!(out, "X");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = ReadFileTool
            .execute(args(json!({"path": "/definitely/not/here.txt"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref p) if p == "/definitely/not/here.txt"));
    }

    #[tokio::test]
    async fn path_is_required() {
        let err = ReadFileTool.execute(ToolArgs::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument(ref k) if k == "path"));
    }
}
