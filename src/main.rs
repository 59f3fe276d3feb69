mod api;
mod assets;
mod cli;
mod config;
mod server;
mod upstream;
mod widget;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::server::AppState;
use crate::upstream::HttpCrmClient;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Score { action } => cli::run_score(action).await,
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = AppConfig::from_env().inspect_err(|err| {
        tracing::error!(
            %err,
            "refusing to start; CRM_BASE_URL, CRM_USERNAME and CRM_PASSWORD must be set"
        );
    })?;
    tracing::info!(base_url = %config.crm.base_url, "CRM API configured");
    tracing::info!(username = %config.crm.username, "CRM credentials loaded");

    let upstream = Arc::new(HttpCrmClient::new(&config.crm)?);
    let addr = config.bind_addr;
    let state = AppState::new(config, upstream);

    tracing::info!(%addr, "starting crm-score-widget proxy");
    server::run(addr, state).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
