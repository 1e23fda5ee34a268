//! Error types for the GoClaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] aggregates them.

use thiserror::Error;

/// The top-level error type for a failed agent turn or CLI operation.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory errors ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Agent loop ---
    #[error("Turn aborted after {rounds} tool-call rounds without a final reply")]
    TurnBudgetExceeded { rounds: usize },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Import failed: {0}")]
    Import(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    #[error("Failed to parse arguments for {tool_name}: {reason}")]
    ArgumentParse { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Missing required argument '{0}'")]
    MissingArgument(String),

    #[error("File does not exist: {0}")]
    NotFound(String),

    #[error("{context}: {reason}")]
    Io { context: String, reason: String },

    #[error("Empty command")]
    EmptyCommand,

    #[error("Command timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Command failed: {status}\nOutput: {output}")]
    CommandFailed { status: String, output: String },
}

impl ToolError {
    /// Build an [`ToolError::Io`] from an I/O failure and a short description
    /// of what was being attempted.
    pub fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 401,
            message: "invalid api key".into(),
        });
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("invalid api key"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = ToolError::ExecutionFailed {
            tool_name: "read_file".into(),
            reason: ToolError::NotFound("/nope".into()).to_string(),
        };
        assert!(err.to_string().contains("read_file"));
        assert!(err.to_string().contains("/nope"));
    }

    #[test]
    fn command_failure_keeps_output() {
        let err = ToolError::CommandFailed {
            status: "exit status: 2".into(),
            output: "ls: cannot access".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("Command failed: exit status: 2"));
        assert!(text.ends_with("Output: ls: cannot access"));
    }

    #[test]
    fn budget_error_names_round_count() {
        let err = Error::TurnBudgetExceeded { rounds: 16 };
        assert!(err.to_string().contains("16"));
    }
}
