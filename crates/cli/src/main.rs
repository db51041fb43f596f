//! thoughtline CLI — the main entry point.
//!
//! Commands:
//! - `run`      — Answer one question and exit
//! - `chat`     — Interactive question loop
//! - `tools`    — List the tools the agent can use
//! - `onboard`  — Write a default config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "thoughtline",
    about = "thoughtline — a ReAct agent for the terminal",
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
    /// Answer a single question
    Run {
        /// The question to answer
        query: String,

        /// Override agent.max_iterations from the config
        #[arg(short, long)]
        max_iterations: Option<usize>,

        /// Print every Thought/Action/Observation step before the answer
        #[arg(short, long)]
        show_steps: bool,
    },

    /// Ask questions interactively
    Chat {
        /// Override agent.max_iterations from the config
        #[arg(short, long)]
        max_iterations: Option<usize>,

        /// Print every step before each answer
        #[arg(short, long)]
        show_steps: bool,
    },

    /// List available tools
    Tools,

    /// Initialize configuration
    Onboard,
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
        Commands::Run {
            query,
            max_iterations,
            show_steps,
        } => commands::run::run(query, max_iterations, show_steps).await?,
        Commands::Chat {
            max_iterations,
            show_steps,
        } => commands::chat::run(max_iterations, show_steps).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
