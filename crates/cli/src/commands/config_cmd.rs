//! `goclaw config`: print the effective configuration.

use crate::runtime::{load_config, open_store, CliResult};
use console::style;
use goclaw_core::memory::ConversationStore;
use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    println!("{}", style("Current Configuration:").yellow());
    println!("  Zhipu API Key:   {}", config.zhipu.masked_api_key());
    println!("  Zhipu Base URL:  {}", config.zhipu.base_url);
    println!("  Zhipu Model:     {}", config.zhipu.model);
    println!("  Temperature:     {:.2}", config.zhipu.temperature);
    println!("  Max Tokens:      {}", config.zhipu.max_tokens);
    println!("  Memory Path:     {}", config.memory.file_path);
    println!("  Workspace:       {}", config.memory.workspace.display());
    println!("  Max History:     {}", config.agent.max_history);
    println!("  Max Tool Rounds: {}", config.agent.max_tool_rounds);

    match store.count().await {
        Ok(count) => println!("  Message Count:   {count}"),
        Err(e) => tracing::warn!(error = %e, "Could not count messages"),
    }

    store.close().await?;
    Ok(())
}
