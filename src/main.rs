#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use complia::config::Config;
use complia::gateway;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "complia", version, about = "Durable compliance-audit chat sessions")]
struct Cli {
    /// Path to config.toml (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the chat gateway
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    let config = Config::load_or_init(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            let port = port.unwrap_or(config.gateway.port);
            gateway::run_gateway(&host, port, config).await
        }
    }
}
