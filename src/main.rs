use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;
mod runner;
mod sandbox;
mod script;

#[derive(Parser)]
#[command(name = "agentbox")]
#[command(
    author,
    version,
    about = "Run AI coding agents inside isolated remote sandboxes"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent task in a fresh sandbox
    Run {
        /// The prompt/task for the agent
        prompt: String,

        /// Model to use (overrides agentbox.toml)
        #[arg(short, long)]
        model: Option<String>,

        /// Sandbox timeout in seconds (overrides agentbox.toml)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Comma-separated list of tools the agent may use
        #[arg(long, value_delimiter = ',')]
        allowed_tools: Option<Vec<String>>,
    },

    /// Validate credentials and configuration without provisioning
    Doctor,

    /// Provision a sandbox and verify the agent tooling inside it
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("agentbox=debug")
    } else {
        EnvFilter::new("agentbox=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            prompt,
            model,
            timeout,
            allowed_tools,
        } => {
            commands::run::run(commands::run::RunArgs {
                prompt,
                model,
                timeout_secs: timeout,
                allowed_tools,
            })
            .await?;
        }
        Commands::Doctor => {
            commands::doctor::run().await?;
        }
        Commands::Check => {
            commands::check::run().await?;
        }
    }

    Ok(())
}
