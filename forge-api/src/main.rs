//! forge-relay server binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use forge_api::{logging, ApiServer};
use forge_config::Config;

#[derive(Debug, Parser)]
#[command(name = "forge-relay", version)]
#[command(about = "REST facade exposing GitLab repository and project operations")]
struct Cli {
    /// Configuration file (defaults to $FORGE_RELAY_CONFIG, then the global one)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Could not load configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    logging::init_logger(&config.log);
    tracing::info!("Starting forge-relay {}", forge_api::VERSION);
    tracing::debug!("Configuration: {:?}", config);

    let server = ApiServer::new(&config)?;
    server.serve(&config.server.bind).await?;
    Ok(())
}
