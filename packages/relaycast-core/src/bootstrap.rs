//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where all
//! services are instantiated and wired together.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::error::{RelayError, RelayResult};
use crate::events::{BroadcastEventBridge, EventEmitter, LoggingEventEmitter};
use crate::platform::{CallGatewayClient, CallPlatform, GroupDirectory, VoiceCallClient};
use crate::resolver::{ArtifactResolver, YtDlpResolver};
use crate::runtime::{TaskSpawner, TokioSpawner};
use crate::services::{PlaybackController, PlaybackSettings, PresenceGate, StatusReporter};
use crate::state::Config;

/// Container for all bootstrapped services.
#[derive(Clone)]
pub struct BootstrappedServices {
    /// Per-group playback orchestration.
    pub controller: Arc<PlaybackController>,
    /// Driving-account presence checks.
    pub presence: Arc<PresenceGate>,
    /// Event bridge feeding the `/api/events` stream.
    pub event_bridge: Arc<BroadcastEventBridge>,
    /// Task spawner for background operations.
    pub spawner: TokioSpawner,
    /// Cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
}

impl BootstrappedServices {
    /// Starts background work: resolving the driving account identity.
    ///
    /// Presence checks fail closed until the identity is known.
    pub fn start_background_tasks(&self) {
        let presence = Arc::clone(&self.presence);
        self.spawner.spawn(async move {
            if presence.refresh_identity().await.is_none() {
                log::warn!(
                    "[Bootstrap] Driving account unknown; playback requests will be refused until it resolves"
                );
            }
        });
    }

    /// Initiates graceful shutdown of all services.
    ///
    /// Releases every queued artifact and leaves every call.
    pub async fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");

        self.cancel_token.cancel();

        let released = self.controller.shutdown_sweep().await;
        log::info!("[Bootstrap] Released {} artifact(s)", released);

        log::info!("[Bootstrap] Shutdown complete");
    }
}

/// Creates the shared HTTP client for call gateway communication.
fn create_http_client(timeout: Duration) -> RelayResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RelayError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Bootstraps all application services against the configured call gateway
/// and `yt-dlp`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the HTTP client
/// cannot be created.
pub fn bootstrap_services(config: &Config) -> RelayResult<BootstrappedServices> {
    let http_client = create_http_client(config.gateway_timeout())?;
    let platform = Arc::new(CallGatewayClient::new(
        http_client,
        &config.gateway_url,
        config.gateway_token.clone(),
    ));
    let resolver: Arc<dyn ArtifactResolver> = Arc::new(YtDlpResolver::new(config.yt_dlp()));

    log::info!(
        "[Bootstrap] Call gateway at {}, downloads in {}",
        config.gateway_url,
        config.download_dir.display()
    );

    bootstrap_services_with(config, platform, resolver)
}

/// Bootstraps services with an explicit call platform and resolver.
///
/// Wiring order:
///
/// 1. Shared infrastructure (event bridge, cancellation token, spawner)
/// 2. Presence gate (depends on the platform directory)
/// 3. Playback controller (depends on resolver, gate, platform, event bridge)
pub fn bootstrap_services_with<P>(
    config: &Config,
    platform: Arc<P>,
    resolver: Arc<dyn ArtifactResolver>,
) -> RelayResult<BootstrappedServices>
where
    P: CallPlatform + 'static,
{
    config.validate().map_err(RelayError::Configuration)?;

    let spawner = TokioSpawner::current();
    let cancel_token = CancellationToken::new();

    let event_bridge = Arc::new(BroadcastEventBridge::new(config.event_channel_capacity));
    event_bridge.set_external_emitter(Arc::new(LoggingEventEmitter));

    let presence = Arc::new(PresenceGate::new(
        Arc::clone(&platform) as Arc<dyn GroupDirectory>
    ));

    let reporter = StatusReporter::new(config.assistant_contact(), config.queue_listing_limit);

    let controller = Arc::new(PlaybackController::new(
        resolver,
        Arc::clone(&presence),
        Arc::clone(&platform) as Arc<dyn VoiceCallClient>,
        Arc::clone(&platform) as Arc<dyn GroupDirectory>,
        Arc::clone(&event_bridge) as Arc<dyn EventEmitter>,
        reporter,
        PlaybackSettings::from(config),
    ));

    Ok(BootstrappedServices {
        controller,
        presence,
        event_bridge,
        spawner,
        cancel_token,
    })
}
