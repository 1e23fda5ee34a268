//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world: read and
//! write files, run commands, search and update the memory files.
//!
//! Handlers receive their arguments as a decoded JSON object ([`ToolArgs`])
//! rather than per-tool structs, which keeps the registry homogeneous.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// Decoded tool arguments.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// The core Tool trait.
///
/// Each built-in tool implements this trait and is registered in the
/// [`ToolRegistry`], which makes it available to the agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments, returning its textual output.
    async fn execute(&self, args: ToolArgs) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The `{type: "function", function: {...}}` envelope the model expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTool {
    #[serde(rename = "type")]
    pub kind: String,

    pub function: ToolDefinition,
}

impl From<ToolDefinition> for ModelTool {
    fn from(function: ToolDefinition) -> Self {
        Self {
            kind: "function".into(),
            function,
        }
    }
}

/// A registry of available tools, keyed by name.
///
/// Populated once at startup, read-only afterwards. Iteration order is by
/// tool name so the tool list sent to the model is stable between requests.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. A later registration replaces any existing tool with
    /// the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            debug!(tool = %name, "Replaced previously registered tool");
        }
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All registered tools, ordered by name.
    pub fn list(&self) -> Vec<&dyn Tool> {
        self.tools.values().map(|t| t.as_ref()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool definitions in the envelope sent with every model request.
    pub fn as_model_tools(&self) -> Vec<ModelTool> {
        self.tools
            .values()
            .map(|t| ModelTool::from(t.to_definition()))
            .collect()
    }

    /// Dispatch a model tool call.
    ///
    /// An empty argument string is treated as `{}`. Failures inside the
    /// handler come back as [`ToolError::ExecutionFailed`].
    pub async fn execute_call(&self, name: &str, arguments: &str) -> std::result::Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let args = parse_arguments(name, arguments)?;

        tool.execute(args).await.map_err(|e| ToolError::ExecutionFailed {
            tool_name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_arguments(tool_name: &str, arguments: &str) -> std::result::Result<ToolArgs, ToolError> {
    if arguments.trim().is_empty() {
        return Ok(ToolArgs::new());
    }

    let value: serde_json::Value =
        serde_json::from_str(arguments).map_err(|e| ToolError::ArgumentParse {
            tool_name: tool_name.to_string(),
            reason: e.to_string(),
        })?;

    match value {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(ToolError::ArgumentParse {
            tool_name: tool_name.to_string(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Read a required string argument.
pub fn required_str<'a>(args: &'a ToolArgs, key: &str) -> std::result::Result<&'a str, ToolError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::MissingArgument(key.to_string()))
}

/// Read an optional string argument. Non-string values count as absent.
pub fn optional_str<'a>(args: &'a ToolArgs, key: &str) -> Option<&'a str> {
    args.get(key).and_then(|v| v.as_str())
}

/// Read an optional integer argument.
///
/// JSON numbers may arrive as integers or as fractional values; the latter
/// are truncated toward zero.
pub fn optional_i64(args: &ToolArgs, key: &str) -> Option<i64> {
    let value = args.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, args: ToolArgs) -> std::result::Result<String, ToolError> {
            Ok(required_str(&args, "text")?.to_string())
        }
    }

    struct ShoutTool;

    #[async_trait]
    impl Tool for ShoutTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input, loudly" }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({ "type": "object", "properties": {} })
        }
        async fn execute(&self, _args: ToolArgs) -> std::result::Result<String, ToolError> {
            Ok("LOUD".into())
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        registry
    }

    #[tokio::test]
    async fn execute_call_dispatches_by_name() {
        let out = registry().execute_call("echo", r#"{"text":"hello"}"#).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let err = registry().execute_call("nope", "{}").await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "nope"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_a_parse_error() {
        let registry = registry();
        let err = registry.execute_call("echo", "{not json").await.unwrap_err();
        assert!(matches!(err, ToolError::ArgumentParse { .. }));

        let err = registry.execute_call("echo", "[1,2]").await.unwrap_err();
        assert!(matches!(err, ToolError::ArgumentParse { .. }));
    }

    #[tokio::test]
    async fn handler_errors_are_wrapped() {
        let err = registry().execute_call("echo", "").await.unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "echo");
                assert!(reason.contains("text"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn dispatch_is_repeatable() {
        let registry = registry();
        let a = registry.execute_call("echo", r#"{"text":"same"}"#).await.unwrap();
        let b = registry.execute_call("echo", r#"{"text":"same"}"#).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let mut registry = registry();
        registry.register(Box::new(ShoutTool));
        assert_eq!(registry.len(), 1);
        let out = registry.execute_call("echo", "{}").await.unwrap();
        assert_eq!(out, "LOUD");
    }

    #[test]
    fn model_tools_use_function_envelope() {
        let tools = registry().as_model_tools();
        assert_eq!(tools.len(), 1);
        let json = serde_json::to_value(&tools[0]).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "echo");
        assert_eq!(json["function"]["parameters"]["required"][0], "text");
    }

    #[test]
    fn integer_arguments_accept_fractional_numbers() {
        let args: ToolArgs = serde_json::from_value(json!({
            "a": 5, "b": 7.9, "c": "nine"
        })).unwrap();
        assert_eq!(optional_i64(&args, "a"), Some(5));
        assert_eq!(optional_i64(&args, "b"), Some(7));
        assert_eq!(optional_i64(&args, "c"), None);
        assert_eq!(optional_i64(&args, "missing"), None);
    }
}
