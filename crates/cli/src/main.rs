//! MultiFlow CLI: the main entry point.
//!
//! Commands:
//! - `ask`: Run a question through every review stage
//! - `direct`: Ask one provider directly
//! - `serve`: Start the HTTP gateway
//! - `status`: Show which stages can run
//! - `onboard`: Write a default config file
//! - `providers`: List the stage bindings

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "multiflow",
    about = "MultiFlow — multi-model review pipeline",
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
    /// Run a question through draft, reviews and synthesis
    Ask {
        /// The question to answer
        question: String,
    },

    /// Send one message to a single provider
    Direct {
        /// gemini, claude, grok, perplexity or chatgpt
        #[arg(short, long)]
        provider: String,

        /// The message to send
        message: String,
    },

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configured providers
    Status,

    /// Write a default configuration file
    Onboard,

    /// List pipeline stages and their providers
    Providers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
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
        Commands::Ask { question } => commands::ask::run(question).await?,
        Commands::Direct { provider, message } => commands::direct::run(provider, message).await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Providers => commands::providers::run().await?,
    }

    Ok(())
}
