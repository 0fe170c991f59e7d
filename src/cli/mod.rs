pub mod commands;
pub mod output;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::alert::{AlertGate, ConsoleAlert};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::router::Navigator;
use crate::session::{FileTokenStorage, TokenStore};

#[derive(Parser)]
#[command(name = "nagare")]
#[command(about = "Nagare CLI - command-line client for the monitoring platform API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },
}

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Navigator for the CLI: there is no router to move, so navigation intents
/// are only logged.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn go(&self, path: String) {
        tracing::debug!(path, "navigation requested");
    }
}

/// Wire up the injectable session context and run the requested command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let config = ClientConfig::from_env();
    let storage = FileTokenStorage::for_config(&config)?;
    let session = Arc::new(TokenStore::new(Box::new(storage)));
    let gate = Arc::new(AlertGate::new(Box::new(ConsoleAlert)));
    let client = ApiClient::new(&config, session, gate, Arc::new(CliNavigator))?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(&client, cmd, output_format).await,
    }
}
