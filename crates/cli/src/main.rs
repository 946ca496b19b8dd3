//! Sous-Chef CLI: the main entry point.
//!
//! Commands:
//! - `onboard`: Write the default config and directories
//! - `chat`: Interactive chat or single-message mode
//! - `pantry`: Print the pantry without contacting the model
//! - `status`: Show configuration and memory bank summary

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(
    name = "souschef",
    about = "Sous-Chef, a conversational kitchen assistant",
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
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directories
    Onboard,

    /// Chat with the Sous-Chef
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show what is in the pantry
    Pantry,

    /// Show configuration and memory status
    Status,
}

fn init_tracing(cli: &Cli) {
    // Chat output shares the terminal with logs, so stay quiet unless asked.
    let fallback = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Chat { .. }, false) => "warn",
        (_, false) => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { message } => commands::chat::run(message).await?,
        Commands::Pantry => commands::pantry::run().await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
