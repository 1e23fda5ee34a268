//! `goclaw chat`: interactive REPL.

use crate::repl::{spawn_line_reader, SlashCommand};
use crate::runtime::{build_agent, load_config, open_store, CliResult};
use console::style;
use goclaw_agent::Agent;
use goclaw_core::memory::ConversationStore;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use tokio::sync::mpsc;

pub async fn run(config_path: Option<&Path>) -> CliResult {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;
    let agent = build_agent(&config, store.clone())?;

    print_banner();

    let input = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    run_session(&agent, store.as_ref(), input, shutdown_signal()).await
}

/// Drive the REPL until `/quit`, end of input, or `shutdown` resolves.
///
/// The store is closed on every exit path.
pub(crate) async fn run_session<S>(
    agent: &Agent,
    store: &dyn ConversationStore,
    mut input: mpsc::Receiver<std::io::Result<String>>,
    shutdown: S,
) -> CliResult
where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        print_prompt()?;

        let line = tokio::select! {
            line = input.recv() => line,
            _ = &mut shutdown => {
                println!("\n\n{}", style("Shutting down gracefully...").yellow());
                break;
            }
        };

        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                store.close().await?;
                return Err(format!("failed to read input: {e}").into());
            }
            None => {
                println!();
                println!("{}", style("Goodbye!").yellow());
                break;
            }
        };

        if let Some(command) = SlashCommand::parse(&line) {
            if command == SlashCommand::Quit {
                println!("{}", style("Goodbye!").yellow());
                break;
            }
            handle_command(agent, command).await;
            continue;
        }

        println!("{}", style("Thinking...").yellow());
        let result = tokio::select! {
            result = agent.chat(&line) => result,
            _ = &mut shutdown => {
                println!("\n\n{}", style("Shutting down gracefully...").yellow());
                break;
            }
        };

        match result {
            Ok(reply) => println!("{}\n", style(format!("AI: {reply}")).cyan()),
            Err(e) => eprintln!("\n{}\n", style(format!("Error: {e}")).red()),
        }
    }

    store.close().await?;
    Ok(())
}

async fn handle_command(agent: &Agent, command: SlashCommand) {
    match command {
        SlashCommand::Quit => {}
        SlashCommand::Clear => match agent.clear_history().await {
            Ok(()) => println!("{}", style("Conversation history cleared.").yellow()),
            Err(e) => eprintln!("{}", style(format!("Error: failed to clear history: {e}")).red()),
        },
        SlashCommand::Help => {
            println!("\n{}", style("Available Tools:").yellow());
            for tool in agent.tools().list() {
                println!("  • {} - {}", tool.name(), tool.description());
            }
            println!();
        }
        SlashCommand::Save(title) => match agent.save_conversation(title.as_deref()).await {
            Ok(path) => println!("{}", style(format!("Conversation saved to {}", path.display())).yellow()),
            Err(e) => eprintln!("{}", style(format!("Error: failed to save conversation: {e}")).red()),
        },
        SlashCommand::Unknown(name) => {
            println!("{}", style(format!("Unknown command: {name}")).yellow());
            println!("{}", style("Available: /quit, /clear, /help, /save").yellow());
        }
    }
}

fn print_banner() {
    println!("{}", style("╔════════════════════════════════════════╗").cyan());
    println!("{}", style("║         GoClaw - AI Assistant          ║").cyan());
    println!("{}", style("║        Powered by Zhipu GLM-4          ║").cyan());
    println!("{}", style("╚════════════════════════════════════════╝").cyan());
    println!("\nCommands:");
    println!("  /clear         - Clear conversation history");
    println!("  /save [title]  - Save the conversation to the workspace");
    println!("  /quit          - Exit");
    println!("  /help          - Show available tools");
    println!("\nType your message and press Enter.\n");
}

fn print_prompt() -> std::io::Result<()> {
    print!("{} ", style("You:").green());
    std::io::stdout().flush()
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use goclaw_core::error::ProviderError;
    use goclaw_core::message::{ChatMessage, Role};
    use goclaw_core::provider::{ChatRequest, ChatResponse, Provider};
    use goclaw_core::tool::ToolRegistry;
    use goclaw_memory::{InMemoryStore, SqliteStore};
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedReply;

    #[async_trait::async_trait]
    impl Provider for FixedReply {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, ProviderError> {
            Ok(ChatResponse::from_message(ChatMessage::assistant("hi")))
        }
    }

    fn agent(store: Arc<InMemoryStore>, workspace: &Path) -> Agent {
        Agent::new(Arc::new(FixedReply), store, Arc::new(ToolRegistry::new()), workspace)
    }

    /// Terminal input that stays open, like an idle interactive stdin.
    fn open_terminal(script: &[u8]) -> (mpsc::Receiver<std::io::Result<String>>, std::io::PipeWriter) {
        let (reader, mut writer) = std::io::pipe().unwrap();
        writer.write_all(script).unwrap();
        (spawn_line_reader(std::io::BufReader::new(reader)), writer)
    }

    #[tokio::test]
    async fn quit_ends_session_while_input_stays_open() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("goclaw.db");
        let db = db.to_str().unwrap();
        let store = Arc::new(SqliteStore::open(db).await.unwrap());
        let tools = Arc::new(ToolRegistry::new());
        let agent = Agent::new(Arc::new(FixedReply), store.clone(), tools, dir.path());
        let (input, _writer) = open_terminal(b"hello\n/quit\n");

        tokio::time::timeout(
            Duration::from_secs(5),
            run_session(&agent, store.as_ref(), input, std::future::pending()),
        )
        .await
        .expect("session should end on /quit")
        .unwrap();

        assert!(store.count().await.is_err());

        // The turn before /quit survives a restart.
        let reopened = SqliteStore::open(db).await.unwrap();
        let rows: Vec<(Role, String)> = reopened
            .history(None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.role, m.content))
            .collect();
        assert_eq!(rows, [(Role::User, "hello".to_string()), (Role::Assistant, "hi".to_string())]);
    }

    #[tokio::test]
    async fn shutdown_signal_ends_idle_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let agent = agent(store.clone(), dir.path());
        let (input, _writer) = open_terminal(b"");

        let signal = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
        };
        tokio::time::timeout(
            Duration::from_secs(5),
            run_session(&agent, store.as_ref(), input, signal),
        )
        .await
        .expect("session should end on shutdown signal")
        .unwrap();

        assert!(store.append(Role::User, "late").await.is_err());
    }
}
