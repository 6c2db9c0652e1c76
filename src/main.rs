use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use provider_sim::config::{Cli, Config};
use provider_sim::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "provider_sim=debug,tower_http=debug"
    } else {
        "provider_sim=info,tower_http=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    info!("provider-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::resolve(&cli) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let listen_addr = config.listen_addr();
    let listener = match TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = listen_addr, error = %e, "Failed to bind");
            return Err(e).with_context(|| format!("failed to bind {listen_addr}"));
        }
    };

    info!(
        addr = listen_addr,
        model = config.model,
        key_validation = "enabled",
        "Starting provider-sim"
    );

    if let Err(e) = server::serve(listener, config, shutdown_signal()).await {
        error!(error = %e, "Server error");
        return Err(e).context("server error");
    }

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
