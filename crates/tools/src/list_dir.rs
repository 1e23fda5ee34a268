//! `list_dir`: human-readable directory listing.

use async_trait::async_trait;
use goclaw_core::error::ToolError;
use goclaw_core::tool::{optional_str, Tool, ToolArgs};

pub struct ListDirTool;

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List the contents of a directory at the specified path"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Absolute or relative path to the directory. Defaults to current directory."
                }
            }
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let path = optional_str(&args, "path").unwrap_or(".");
        let abs_path = std::path::absolute(path).map_err(|e| ToolError::io("Failed to resolve path", e))?;

        let mut reader = tokio::fs::read_dir(&abs_path)
            .await
            .map_err(|e| ToolError::io("Failed to read directory", e))?;

        let mut entries: Vec<(String, bool)> = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| ToolError::io("Failed to read directory", e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        entries.sort();

        let mut out = format!("Contents of {}:\n", abs_path.display());
        for (name, is_dir) in entries {
            let tag = if is_dir { "[DIR] " } else { "[FILE]" };
            out.push_str(&format!("  {tag} {name}\n"));
        }
        Ok(out)
    }
}
