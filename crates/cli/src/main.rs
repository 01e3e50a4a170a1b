//! Wayfarer CLI, the main entry point.
//!
//! Commands:
//! - `chat`          Interactive or single-message mode
//! - `capabilities`  List what the connected workers offer
//! - `suggest`       Example requests for the connected domains
//! - `worker`        Serve a built-in worker over stdio
//! - `init`          Write a default config file
//! - `status`        Show configuration and worker health

use clap::{Parser, Subcommand};
use wayfarer_config::BuiltinWorker;

mod commands;

#[derive(Parser)]
#[command(
    name = "wayfarer",
    about = "Wayfarer: travel requests answered by capability workers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the travel agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// List discovered capabilities, grouped by worker
    Capabilities,

    /// Show example requests
    Suggest,

    /// Serve a built-in worker on stdin/stdout
    Worker {
        /// utility, demo_trains, live_trains or hotels
        kind: BuiltinWorker,

        /// Worker name used in capability listings
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Write the default configuration file
    Init,

    /// Show configuration and worker status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries answers and, for `worker`, the RPC stream.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Capabilities => commands::capabilities::run().await?,
        Commands::Suggest => commands::suggest::run().await?,
        Commands::Worker { kind, name } => commands::worker::run(kind, name).await?,
        Commands::Init => commands::init::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
