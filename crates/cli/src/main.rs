//! kbchat CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP API
//! - `ask`: Ask one question from the terminal
//! - `history`: Print a stored conversation
//! - `config`: Show, locate or validate configuration
//! - `doctor`: Diagnose setup problems

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "kbchat",
    about = "Chat restricted to a knowledge base",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "KBCHAT_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question
    Ask {
        /// The question to ask
        question: String,

        /// Continue an existing conversation ("New" starts one)
        #[arg(short, long, default_value = kbchat_core::NEW_CONVERSATION)]
        chat_id: String,

        /// Sampling temperature between 0.0 and 1.0
        #[arg(short, long, value_parser = commands::parse_temperature)]
        temperature: Option<f32>,

        /// Print the reply as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the messages of a conversation
    History {
        chat_id: String,

        /// Print the transcript as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file location
    Path,
    /// Check the configuration for errors
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask {
            question,
            chat_id,
            temperature,
            json,
        } => commands::ask::run(question, chat_id, temperature, json).await?,
        Commands::History { chat_id, json } => commands::history::run(chat_id, json).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
