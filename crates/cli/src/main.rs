//! ragchat CLI - the main entry point.
//!
//! Commands:
//! - `serve`   - Start the HTTP gateway and chat UI
//! - `status`  - Show the effective configuration
//! - `doctor`  - Check configuration and reachability of every service
//! - `peek`    - Print records stored in a collection
//! - `config`  - Print the effective configuration as TOML

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "ragchat",
    about = "ragchat - retrieval-augmented chat backend",
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
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to ~/.ragchat/config.toml)
    #[arg(short, long, global = true, env = "RAGCHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway and chat UI
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show the effective configuration
    Status,

    /// Check configuration and service reachability
    Doctor,

    /// Print records stored in a collection
    Peek {
        /// Collection name (the user id)
        collection: String,

        /// Maximum number of records to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config_path, port).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Peek { collection, limit } => commands::peek::run(config_path, &collection, limit).await?,
        Commands::Config => commands::config_cmd::show(config_path).await?,
    }

    Ok(())
}
