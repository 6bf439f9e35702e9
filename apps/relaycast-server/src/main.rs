//! RelayCast Server - standalone headless relay for group voice-chat music.
//!
//! Exposes the playback API over HTTP. A chat bot front end forwards group
//! commands to it, and the call gateway reports end-of-track notifications.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::RwLock;
use relaycast_core::{bootstrap_services, start_server, AppState};
use tokio::signal;

use crate::config::ServerConfig;

/// RelayCast Server - headless group voice-chat music relay.
#[derive(Parser, Debug)]
#[command(name = "relaycast-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "RELAYCAST_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "RELAYCAST_BIND_PORT")]
    port: Option<u16>,

    /// Bind address (overrides config file).
    #[arg(short = 'b', long, env = "RELAYCAST_BIND_ADDRESS")]
    bind_address: Option<std::net::IpAddr>,

    /// Call gateway base URL (overrides config file).
    #[arg(short = 'g', long, env = "RELAYCAST_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Call gateway bearer token.
    #[arg(long, env = "RELAYCAST_GATEWAY_TOKEN", hide_env_values = true)]
    gateway_token: Option<String>,

    /// Directory for downloaded audio.
    #[arg(short = 'd', long, env = "RELAYCAST_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Shared secret required in the X-Relay-Secret header.
    #[arg(long, env = "RELAYCAST_API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("RelayCast Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if let Some(ip) = args.bind_address {
        config.bind_address = ip;
    }
    if let Some(url) = args.gateway_url {
        config.gateway_url = url;
    }
    if let Some(token) = args.gateway_token {
        config.gateway_token = Some(token);
    }
    if let Some(dir) = args.download_dir {
        config.download_dir = Some(dir);
    }
    if let Some(secret) = args.api_secret {
        config.api_secret = Some(secret);
    }

    if config.api_secret.is_none() {
        log::warn!("No api_secret configured - the API accepts unauthenticated requests");
    }

    let core_config = config.to_core_config();
    log::info!(
        "Configuration: bind={}:{}, gateway={}, download_dir={}",
        config.bind_address,
        config.bind_port,
        core_config.gateway_url,
        core_config.download_dir.display()
    );

    std::fs::create_dir_all(&core_config.download_dir).with_context(|| {
        format!(
            "Failed to create download directory: {}",
            core_config.download_dir.display()
        )
    })?;

    let services = bootstrap_services(&core_config).context("Failed to bootstrap services")?;
    log::info!("Services bootstrapped successfully");

    services.start_background_tasks();

    // Build app state for the HTTP server
    let app_state = AppState::new(&services, Arc::new(RwLock::new(core_config)));
    let addr = SocketAddr::new(config.bind_address, config.bind_port);
    let cancel = services.cancel_token.clone();

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(app_state, addr, cancel).await {
            log::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    shutdown_signal().await;

    log::info!("Shutdown signal received, cleaning up...");

    // Cancels the server and leaves every call
    services.shutdown().await;

    if let Err(e) = server_handle.await {
        log::warn!("Server task ended abnormally: {}", e);
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
