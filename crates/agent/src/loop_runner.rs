//! The agent turn loop implementation.

use crate::prompt::{build_system_prompt, BASE_SYSTEM_PROMPT};
use goclaw_config::AppConfig;
use goclaw_core::context::ContextLoader;
use goclaw_core::error::{Error, Result};
use goclaw_core::memory::ConversationStore;
use goclaw_core::message::{ChatMessage, Role};
use goclaw_core::provider::{ChatRequest, Provider};
use goclaw_core::tool::ToolRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default number of persisted messages replayed to the model.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Default cap on tool-call rounds within one turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 16;

/// Orchestrates the store, the context loader, the model and the tools.
///
/// Turns are strictly serial: callers must not run two `chat` calls on the
/// same agent concurrently.
pub struct Agent {
    /// The model client
    provider: Arc<dyn Provider>,

    /// Durable conversation log
    store: Arc<dyn ConversationStore>,

    /// Tool registry, read-only after startup
    tools: Arc<ToolRegistry>,

    /// Workspace identity and memory files
    context: ContextLoader,

    /// Instructions that precede the workspace context
    base_prompt: String,

    /// Persisted messages replayed per turn
    max_history: usize,

    /// Tool-call rounds allowed per turn
    max_tool_rounds: usize,
}

impl Agent {
    /// Create an agent with default limits and the built-in system prompt.
    pub fn new(
        provider: Arc<dyn Provider>,
        store: Arc<dyn ConversationStore>,
        tools: Arc<ToolRegistry>,
        workspace: impl AsRef<Path>,
    ) -> Self {
        Self {
            provider,
            store,
            tools,
            context: ContextLoader::new(workspace),
            base_prompt: BASE_SYSTEM_PROMPT.to_string(),
            max_history: DEFAULT_MAX_HISTORY,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Create an agent configured from the `agent` and `memory` sections.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        store: Arc<dyn ConversationStore>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let agent = Self::new(provider, store, tools, &config.memory.workspace)
            .with_max_history(config.agent.max_history)
            .with_max_tool_rounds(config.agent.max_tool_rounds);
        match &config.agent.system_prompt {
            Some(prompt) => agent.with_system_prompt(prompt.clone()),
            None => agent,
        }
    }

    /// Set how many persisted messages are replayed to the model.
    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }

    /// Set the maximum number of tool-call rounds per turn.
    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    /// Replace the built-in base system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.base_prompt = prompt.into();
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn workspace(&self) -> &Path {
        self.context.workspace()
    }

    /// The system prompt for the next turn. Context files are re-read on every call.
    pub async fn system_prompt(&self) -> String {
        let files = self.context.load().await;
        build_system_prompt(&self.base_prompt, &files)
    }

    /// Run one user turn and return the model's final reply.
    ///
    /// On success exactly two rows are persisted: the user message and the
    /// final reply. On failure the user message stays persisted and no
    /// assistant row is written.
    pub async fn chat(&self, user_text: &str) -> Result<String> {
        self.store.append(Role::User, user_text).await?;

        let history = self.store.to_provider_format(Some(self.max_history)).await?;
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(self.system_prompt().await));
        messages.extend(history);

        let tool_defs = self.tools.as_model_tools();
        info!(
            messages = messages.len(),
            tools = tool_defs.len(),
            "Processing user turn"
        );

        let mut response = self
            .provider
            .chat(ChatRequest::new(messages.clone()).with_tools(tool_defs.clone()))
            .await?;
        let mut rounds = 0;

        while response.has_tool_calls() {
            if rounds == self.max_tool_rounds {
                warn!(rounds, "Tool-call budget exhausted, abandoning turn");
                return Err(Error::TurnBudgetExceeded { rounds });
            }
            rounds += 1;

            let tool_calls = response.tool_calls().to_vec();
            debug!(round = rounds, tool_count = tool_calls.len(), "Executing tool calls");
            messages.push(ChatMessage::assistant_with_tools(response.content(), tool_calls.clone()));

            for tc in &tool_calls {
                let started = Instant::now();
                let result = self.tools.execute_call(&tc.name, &tc.arguments).await;
                let duration_ms = started.elapsed().as_millis() as u64;

                let content = match result {
                    Ok(output) => {
                        debug!(tool = %tc.name, duration_ms, "Tool executed");
                        output
                    }
                    Err(e) => {
                        warn!(tool = %tc.name, duration_ms, error = %e, "Tool execution failed");
                        format!("Error: {e}")
                    }
                };
                messages.push(ChatMessage::tool_result(&tc.id, content));
            }

            response = self
                .provider
                .chat(ChatRequest::new(messages.clone()).with_tools(tool_defs.clone()))
                .await?;
        }

        let reply = response.content().to_string();
        if reply.is_empty() {
            warn!(rounds, "Model ended the turn without any text");
        }
        self.store.append(Role::Assistant, &reply).await?;

        info!(rounds, reply_len = reply.len(), "Turn complete");
        Ok(reply)
    }

    /// Delete the persisted conversation.
    pub async fn clear_history(&self) -> Result<()> {
        self.store.clear().await?;
        info!("Conversation history cleared");
        Ok(())
    }

    /// Export the conversation as markdown under `memory/conversations/`.
    pub async fn save_conversation(&self, title: Option<&str>) -> Result<PathBuf> {
        goclaw_tools::save_conversation(self.workspace(), self.store.as_ref(), title).await
    }
}
