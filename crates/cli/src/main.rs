//! Codewright CLI: the main entry point.
//!
//! Commands:
//! - `init`: Create `.codewright/` and a default config in the project
//! - `run`: Give the agent one task and wait for its answer
//! - `chat`: Interactive session
//! - `scan`: Print the project tree
//! - `tools`: List the tools the agent can use
//! - `memory`: Inspect or clear the stored conversation
//! - `status`: Show configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod console;

#[derive(Parser)]
#[command(
    name = "codewright",
    about = "Codewright — an autonomous coding agent for your terminal",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory the agent works in
    #[arg(short, long, global = true, default_value = ".")]
    path: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the project state directory and a default config
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run a single task to completion
    Run {
        /// What the agent should do
        message: String,

        /// Override the maximum number of tool calls
        #[arg(long)]
        max_turns: Option<usize>,
    },

    /// Start an interactive session
    Chat,

    /// Print the project structure
    Scan {
        /// Maximum directory depth
        #[arg(short, long, default_value_t = 10)]
        depth: usize,

        /// Also print the contents of matching files
        #[arg(long)]
        contents: bool,
    },

    /// List available tools
    Tools,

    /// Inspect the stored conversation
    Memory {
        #[command(subcommand)]
        action: MemoryCommands,
    },

    /// Show configuration and project state
    Status,
}

#[derive(Subcommand)]
enum MemoryCommands {
    /// Message counts per role and storage details
    Stats,

    /// Print the most recent messages
    History {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Delete the stored conversation
    Clear {
        /// Required; clearing cannot be undone
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = commands::resolve_root(&cli.path)?;

    match cli.command {
        Commands::Init { force } => commands::init::run(&root, force).await?,
        Commands::Run { message, max_turns } => commands::run::run(&root, &message, max_turns).await?,
        Commands::Chat => commands::chat::run(&root).await?,
        Commands::Scan { depth, contents } => commands::scan::run(&root, depth, contents).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Memory { action } => match action {
            MemoryCommands::Stats => commands::memory::stats(&root).await?,
            MemoryCommands::History { limit } => commands::memory::history(&root, limit).await?,
            MemoryCommands::Clear { confirm } => commands::memory::clear(&root, confirm).await?,
        },
        Commands::Status => commands::status::run(&root).await?,
    }

    Ok(())
}
