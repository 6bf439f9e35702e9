//! HTTP API layer.
//!
//! This module contains thin handlers that delegate to the playback
//! controller. It provides the router construction and server startup.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::bootstrap::BootstrappedServices;
use crate::events::BroadcastEventBridge;
use crate::runtime::TokioSpawner;
use crate::services::PlaybackController;
use crate::state::Config;

pub mod http;
pub mod response;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to a TCP port.
    #[error("Failed to bind to port: {0}")]
    Bind(#[from] std::io::Error),
}

/// Shared application state for the API layer.
///
/// Holds references to services; all business logic lives in the services.
#[derive(Clone)]
pub struct AppState {
    /// Per-group playback orchestration.
    pub controller: Arc<PlaybackController>,
    /// Event bridge for the Server-Sent Events stream.
    pub event_bridge: Arc<BroadcastEventBridge>,
    /// Runs requests detached from the connection that carried them.
    pub spawner: TokioSpawner,
    /// Application configuration.
    pub config: Arc<RwLock<Config>>,
}

impl AppState {
    pub fn new(services: &BootstrappedServices, config: Arc<RwLock<Config>>) -> Self {
        Self {
            controller: Arc::clone(&services.controller),
            event_bridge: Arc::clone(&services.event_bridge),
            spawner: services.spawner.clone(),
            config,
        }
    }
}

/// Binds `addr` and serves the API until `cancel` fires.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("[Server] Listening on http://{}", listener.local_addr()?);
    serve(listener, state, cancel).await
}

/// Serves the API on an already-bound listener until `cancel` fires.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), ServerError> {
    let trusted_origins = state.config.read().trusted_origins.clone();
    log::info!("[Server] CORS trusted origins: {:?}", trusted_origins);

    let app = http::create_router(state)
        .layer(http::cors_layer(trusted_origins))
        .layer(TraceLayer::new_for_http());

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    log::info!("[Server] HTTP server stopped");
    Ok(())
}
