//! Startup wiring shared by the subcommands.

use goclaw_agent::Agent;
use goclaw_config::AppConfig;
use goclaw_core::memory::ConversationStore;
use goclaw_memory::SqliteStore;
use goclaw_providers::ZhipuClient;
use std::path::Path;
use std::sync::Arc;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    AppConfig::load(path).map_err(|e| format!("failed to load config: {e}").into())
}

pub async fn open_store(config: &AppConfig) -> CliResult<Arc<SqliteStore>> {
    let store = SqliteStore::open(&config.memory.file_path)
        .await
        .map_err(|e| format!("failed to initialize memory: {e}"))?;
    tracing::debug!(path = %config.memory.file_path, "Conversation store opened");
    Ok(Arc::new(store))
}

/// Wire the model client, the tool registry and the agent around `store`.
pub fn build_agent(config: &AppConfig, store: Arc<dyn ConversationStore>) -> CliResult<Agent> {
    let provider = ZhipuClient::new(&config.zhipu)?;
    let tools = goclaw_tools::default_registry(&config.memory.workspace, store.clone());
    tracing::debug!(
        model = %provider.model(),
        tools = tools.len(),
        workspace = %config.memory.workspace.display(),
        "Agent ready"
    );
    Ok(Agent::from_config(config, Arc::new(provider), store, Arc::new(tools)))
}
