use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use thio_core::ChatConfig;
use thio_core::config::parse_provider;

mod commands;

#[derive(Parser)]
#[command(name = "thio")]
#[command(about = "THIO - conversational assistant with pluggable model providers", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Provider for this session: local, openai, gemini, ollama or none
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// List the models installed on the Ollama daemon
    Models,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ChatConfig::load_with_env(cli.config.as_deref())?;
    if let Some(name) = &cli.provider {
        config.provider = parse_provider(name)?;
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(config).await?,
        Commands::Models => commands::models::list(&config).await?,
    }

    Ok(())
}
