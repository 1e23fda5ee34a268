//! GoClaw CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Interactive chat with the agent
//! - `config`: Show the effective configuration
//! - `memory`: Inspect, clear, export or import the conversation log
//! - `init`: Identity questionnaire for the workspace

use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod repl;
mod runtime;

#[derive(Parser)]
#[command(
    name = "goclaw",
    about = "GoClaw, an AI assistant with tool support",
    long_about = "GoClaw is an AI assistant that supports conversations, \
                  tool execution (file operations, commands), and memory management.",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat
    Chat,

    /// Show current configuration
    Config,

    /// Memory management commands
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Create a personalised IDENTITY.md through a short questionnaire
    Init,
}

#[derive(Subcommand)]
enum MemoryAction {
    /// Clear conversation history
    Clear,

    /// Show conversation history
    Show {
        /// Maximum number of messages to print
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },

    /// Write the conversation history to a JSON file
    Export {
        file: PathBuf,
    },

    /// Append messages from a JSON file produced by `memory export`
    Import {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Chat => commands::chat::run(config_path).await,
        Commands::Config => commands::config_cmd::run(config_path).await,
        Commands::Memory { action } => match action {
            MemoryAction::Clear => commands::memory::clear(config_path).await,
            MemoryAction::Show { limit } => commands::memory::show(config_path, limit).await,
            MemoryAction::Export { file } => commands::memory::export(config_path, &file).await,
            MemoryAction::Import { file } => commands::memory::import(config_path, &file).await,
        },
        Commands::Init => commands::init::run(config_path).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn memory_show_defaults_to_one_hundred() {
        let cli = Cli::try_parse_from(["goclaw", "memory", "show"]).unwrap();
        match cli.command {
            Commands::Memory { action: MemoryAction::Show { limit } } => assert_eq!(limit, 100),
            _ => panic!("expected memory show"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["goclaw", "chat", "--config", "/tmp/x.yaml", "-v"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/x.yaml")));
        assert!(cli.verbose);
    }
}
