use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser)]
#[command(name = "npmreg")]
#[command(about = "S3-backed npm registry core")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an object-store notification batch and update manifests
    Process {
        /// Path to the notification JSON; reads stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print a package manifest, synthesizing it when not materialized
    Resolve {
        /// Package name
        package: String,
    },
    /// Search materialized manifests
    Search {
        /// Substring to match against manifest keys
        text: Option<String>,
    },
    /// Print the static registry descriptor
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process { file } => cli::process::run(file).await,
        Commands::Resolve { package } => cli::resolve::run(&package).await,
        Commands::Search { text } => cli::search::run(text.as_deref()).await,
        Commands::Info => cli::info::run(),
    }
}
