//! `goclaw memory`: conversation log management.

use crate::runtime::{load_config, open_store, CliResult};
use chrono::Local;
use console::style;
use goclaw_core::memory::ConversationStore;
use goclaw_core::message::Role;
use std::path::Path;

pub async fn clear(config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    store
        .clear()
        .await
        .map_err(|e| format!("failed to clear memory: {e}"))?;
    store.close().await?;

    println!("{}", style("✓ Conversation history cleared").yellow());
    Ok(())
}

pub async fn show(config_path: Option<&Path>, limit: usize) -> CliResult {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    let messages = store
        .history(Some(limit))
        .await
        .map_err(|e| format!("failed to get history: {e}"))?;
    store.close().await?;

    if messages.is_empty() {
        println!("{}", style("No messages in history").yellow());
        return Ok(());
    }

    println!("\n{}", style(format!("Conversation History ({} messages):", messages.len())).yellow());
    println!("─────────────────────────────────────");

    for msg in &messages {
        let at = msg.timestamp.with_timezone(&Local).format("%m-%d %H:%M");
        match msg.role {
            Role::User => println!("\n{} {}", style(format!("[User {at}]")).green(), msg.content),
            Role::Assistant => println!("\n{} {}", style(format!("[AI {at}]")).cyan(), msg.content),
            _ => {}
        }
    }

    println!("\n─────────────────────────────────────\n");
    Ok(())
}

pub async fn export(config_path: Option<&Path>, file: &Path) -> CliResult {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    let json = store.export_json().await?;
    let count = store.count().await?;
    store.close().await?;

    tokio::fs::write(file, json)
        .await
        .map_err(|e| format!("failed to write {}: {e}", file.display()))?;

    println!(
        "{}",
        style(format!("✓ Exported {count} messages to {}", file.display())).yellow()
    );
    Ok(())
}

pub async fn import(config_path: Option<&Path>, file: &Path) -> CliResult {
    let data = tokio::fs::read(file)
        .await
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;

    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    let imported = store.import_json(&data).await;
    store.close().await?;
    let imported = imported?;

    println!(
        "{}",
        style(format!("✓ Imported {imported} messages from {}", file.display())).yellow()
    );
    Ok(())
}
