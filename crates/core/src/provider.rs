//! Provider trait: the abstraction over the remote chat-completions endpoint.
//!
//! A Provider takes a [`ChatRequest`] and returns the model's [`ChatResponse`].
//! Only the first choice of a response is ever consulted by the agent loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::{ChatMessage, ToolCall};
use crate::tool::ModelTool;

/// A chat-completions request.
///
/// `model`, `temperature` and `max_tokens` are optional so that the client can
/// fill them from configuration when the caller leaves them unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// The conversation messages
    pub messages: Vec<ChatMessage>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ModelTool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    pub fn with_tools(mut self, tools: Vec<ModelTool>) -> Self {
        self.tools = tools;
        self
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,

    pub message: ChatMessage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// A complete response from the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatResponse {
    /// A single-choice response, mostly useful for tests and mocks.
    pub fn from_message(message: ChatMessage) -> Self {
        Self {
            choices: vec![Choice {
                index: 0,
                message,
                finish_reason: None,
            }],
            usage: None,
            model: None,
        }
    }

    fn first(&self) -> Option<&ChatMessage> {
        self.choices.first().map(|c| &c.message)
    }

    /// True iff the first choice requests at least one tool call.
    pub fn has_tool_calls(&self) -> bool {
        self.first().is_some_and(|m| !m.tool_calls.is_empty())
    }

    /// The first choice's text, empty when absent.
    pub fn content(&self) -> &str {
        self.first().map(|m| m.content.as_str()).unwrap_or("")
    }

    /// The first choice's tool calls, in model order.
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.first().map(|m| m.tool_calls.as_slice()).unwrap_or(&[])
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The agent loop calls `chat()` without knowing which backend answers it,
/// which is what lets tests drive the loop with a scripted provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "zhipu").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn chat(&self, request: ChatRequest) -> std::result::Result<ChatResponse, ProviderError>;
}
