//! ---
//! ra_section: "01-core-functionality"
//! ra_subsection: "binary"
//! ra_type: "source"
//! ra_scope: "code"
//! ra_description: "Binary entrypoint for the Ruwang Arsip daemon."
//! ra_version: "v0.1.0"
//! ra_owner: "arsip-platform"
//! ---
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use ra_api::{spawn_api_server, ApiState};
use ra_archive::seed;
use ra_common::config::AppConfig;
use ra_common::logging::init_tracing;
use ra_security::IdentityProvider;
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ruwang Arsip dashboard daemon", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "ADDR", help = "Override api.listen")]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/example.prod.toml"));
    candidates.push(PathBuf::from("configs/example.dev.toml"));

    let loaded = AppConfig::load_or_default(&candidates)?;
    let mut config = loaded.config;
    if let Some(listen) = cli.listen {
        config.api.listen = listen;
    }
    init_tracing("ra-arsipd", &config.logging)?;
    match &loaded.source {
        Some(path) => info!(config_path = %path.display(), "configuration loaded"),
        None => warn!("no configuration file found; running with defaults"),
    }

    run_daemon(config).await
}

async fn run_daemon(config: AppConfig) -> Result<()> {
    if !config.api.enabled {
        info!("api server disabled by configuration; nothing to run");
        return Ok(());
    }

    let identity = IdentityProvider::with_users(seed::users());
    let state = Arc::new(ApiState::from_config(&config, identity)?);
    info!(
        storage = %config.storage.directory.display(),
        audit = config.audit.enabled,
        idle_timeout_secs = config.session.idle_timeout.as_secs(),
        "archive state initialised"
    );

    let server = spawn_api_server(state, config.api.listen)?;
    info!(address = %server.addr(), "daemon running; waiting for termination signal");
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    server.shutdown().await?;
    Ok(())
}
