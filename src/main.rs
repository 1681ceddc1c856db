//! automerge-bot - forward-merge pushed changes between branches

mod cli;

use anyhow::Result;
use automerge_bot::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "automerge-bot")]
#[command(about = "Forward-merge pushed changes along configured merge directions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive GitHub webhooks and run the stale pull request governor
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:5000")]
        listen: SocketAddr,
    },

    /// Print the configured merge directions as a DOT graph
    Graph,

    /// Validate the configuration file and print a summary
    CheckConfig,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Serve { listen } => cli::run_serve(&cli.config, listen).await,
        Commands::Graph => cli::run_graph(&cli.config),
        Commands::CheckConfig => cli::run_check_config(&cli.config),
    }
}
