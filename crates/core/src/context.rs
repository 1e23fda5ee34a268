//! Workspace context: identity and memory files injected into the system prompt.
//!
//! Three files are consulted, in priority order:
//!
//! 1. `IDENTITY.md`: who the assistant is
//! 2. `SOUL.md`: personality, tone, style
//! 3. `memory/MEMORY.md`: long-term notes, appended to by `update_memory`
//!
//! Each file is optional. Missing files are silently skipped. The loader is
//! re-run on every turn so edits made between turns are picked up.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Well-known context file names.
pub const IDENTITY_FILE: &str = "IDENTITY.md";
pub const SOUL_FILE: &str = "SOUL.md";
pub const MEMORY_FILE: &str = "memory/MEMORY.md";

const CONTEXT_FILES: [&str; 3] = [IDENTITY_FILE, SOUL_FILE, MEMORY_FILE];

/// A loaded workspace file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    /// Path relative to the workspace, e.g. `memory/MEMORY.md`
    pub logical_path: String,
    pub content: String,
}

/// Loads context files from a workspace directory.
#[derive(Debug, Clone)]
pub struct ContextLoader {
    workspace: PathBuf,
}

impl ContextLoader {
    /// Create a loader rooted at `workspace`. A leading `~` is expanded.
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: expand_tilde(workspace),
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Load every context file that exists, in priority order.
    pub async fn load(&self) -> Vec<ContextFile> {
        let mut files = Vec::new();

        for name in CONTEXT_FILES {
            match self.load_file(name).await {
                Ok(file) => {
                    debug!(file = %name, "Loaded context file");
                    files.push(file);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(file = %self.workspace.join(name).display(), error = %e, "Failed to read context file, skipping");
                }
            }
        }

        files
    }

    /// Load one file relative to the workspace; a missing file is an error here.
    async fn load_file(&self, name: &str) -> std::io::Result<ContextFile> {
        let content = tokio::fs::read_to_string(self.workspace.join(name)).await?;
        Ok(ContextFile {
            logical_path: name.to_string(),
            content,
        })
    }
}

/// Format loaded files as the markdown fragment appended to the system prompt.
///
/// An empty list yields an empty string.
pub fn build_context_prompt(files: &[ContextFile]) -> String {
    if files.is_empty() {
        return String::new();
    }

    let mut sections: Vec<String> = vec![
        "## Workspace 上下文文件".into(),
        String::new(),
        "以下文件已加载，提供了我的身份和记忆：".into(),
        String::new(),
    ];

    for file in files {
        sections.push(format!("### {}", file.logical_path));
        sections.push(String::new());
        sections.push(file.content.clone());
        sections.push(String::new());
    }

    sections.join("\n")
}

/// The current user's home directory, from `HOME` (or `USERPROFILE` on Windows).
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// Expand a leading `~` (alone or followed by a separator) to the home directory.
/// Paths without a leading tilde, or with no resolvable home, are returned unchanged.
pub fn expand_tilde(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
