//! `exec_command`: run a program with a wall-clock timeout.
//!
//! The command line is split on whitespace and run directly, with no shell
//! interpretation. There is no sandboxing; the timeout is the only limit.

use async_trait::async_trait;
use goclaw_core::error::ToolError;
use goclaw_core::tool::{optional_i64, required_str, Tool, ToolArgs};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default timeout when the model does not ask for one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub struct ExecCommandTool;

#[async_trait]
impl Tool for ExecCommandTool {
    fn name(&self) -> &str {
        "exec_command"
    }

    fn description(&self) -> &str {
        "Execute a shell command and return its output. Use with caution."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in seconds (default: 30)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<String, ToolError> {
        let command = required_str(&args, "command")?;
        let timeout_secs = match optional_i64(&args, "timeout") {
            Some(secs) if secs > 0 => secs as u64,
            _ => DEFAULT_TIMEOUT_SECS,
        };

        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some((program, argv)) = parts.split_first() else {
            return Err(ToolError::EmptyCommand);
        };

        debug!(command = %command, timeout_secs, "Executing command");
        let started = Instant::now();

        // kill_on_drop: when the timeout fires the pending child is dropped and killed.
        let child = Command::new(program)
            .args(argv)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(timeout_secs), child)
            .await
            .map_err(|_| {
                warn!(command = %command, timeout_secs, "Command timed out");
                ToolError::Timeout { timeout_secs }
            })?
            .map_err(|e| ToolError::io(format!("Failed to start '{program}'"), e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(
            command = %command,
            elapsed_ms = started.elapsed().as_millis() as u64,
            status = %output.status,
            "Command finished"
        );

        if !output.status.success() {
            return Err(ToolError::CommandFailed {
                status: output.status.to_string(),
                output: combined,
            });
        }
        Ok(combined)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArgs {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn execute_echo() {
        let out = ExecCommandTool
            .execute(args(json!({"command": "echo hello world"})))
            .await
            .unwrap();
        assert_eq!(out, "hello world\n");
    }

    #[tokio::test]
    async fn arguments_are_not_shell_interpreted() {
        let out = ExecCommandTool
            .execute(args(json!({"command": "echo $HOME;ls"})))
            .await
            .unwrap();
        assert_eq!(out, "$HOME;ls\n");
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let err = ExecCommandTool
            .execute(args(json!({"command": "   "})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::EmptyCommand));
    }

    #[tokio::test]
    async fn non_zero_exit_reports_output() {
        let err = ExecCommandTool
            .execute(args(json!({"command": "ls /definitely/not/a/dir"})))
            .await
            .unwrap_err();
        match err {
            ToolError::CommandFailed { output, .. } => assert!(!output.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn timeout_is_enforced() {
        let started = Instant::now();
        let err = ExecCommandTool
            .execute(args(json!({"command": "sleep 10", "timeout": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { timeout_secs: 1 }));
        assert!(started.elapsed() <= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn fractional_timeout_is_truncated() {
        let started = Instant::now();
        let err = ExecCommandTool
            .execute(args(json!({"command": "sleep 10", "timeout": 1.9})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { timeout_secs: 1 }));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn unknown_program_is_an_io_error() {
        let err = ExecCommandTool
            .execute(args(json!({"command": "no-such-program-goclaw"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Io { .. }));
    }
}
