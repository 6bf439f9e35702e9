//! Core configuration.
//!
//! [`Config`] holds every tunable of the relay. The server binary fills it
//! from YAML, environment and CLI; embedders may construct it directly.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{
    DEFAULT_QUEUE_LISTING_LIMIT, DEFAULT_RESOLVE_TIMEOUT_SECS, DIAGNOSTIC_MAX_CHARS,
    EVENT_CHANNEL_CAPACITY, GATEWAY_TIMEOUT_SECS,
};
use crate::resolver::YtDlpConfig;
use crate::services::AssistantContact;

/// Configuration for the RelayCast core.
///
/// All fields have sensible defaults.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    // Resolver
    /// Downloader program.
    pub resolver_program: String,

    /// Extra arguments placed before the generated downloader arguments.
    pub resolver_args: Vec<String>,

    /// Upper bound on one resolution (seconds).
    pub resolve_timeout_secs: u64,

    /// Directory receiving downloaded artifacts.
    pub download_dir: PathBuf,

    /// Explicit ffmpeg binary or directory.
    pub ffmpeg_location: Option<PathBuf>,

    // Call platform
    /// Base URL of the call gateway.
    pub gateway_url: String,

    /// Per-request timeout for gateway calls (seconds).
    pub gateway_timeout_secs: u64,

    /// Bearer token for the gateway.
    pub gateway_token: Option<String>,

    // Presentation
    /// Handle of the driving account, with or without `@`.
    pub assistant_handle: String,

    /// Prefix for the assistant's public link.
    pub invite_link_base: String,

    /// Maximum entries in a queue listing.
    pub queue_listing_limit: usize,

    /// Maximum characters of a diagnostic shown to users.
    pub diagnostic_max_chars: usize,

    // Transport
    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,

    /// Shared secret required in the `X-Relay-Secret` header, if set.
    pub api_secret: Option<String>,

    /// Origin prefixes allowed by CORS.
    pub trusted_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolver_program: "yt-dlp".to_string(),
            resolver_args: Vec::new(),
            resolve_timeout_secs: DEFAULT_RESOLVE_TIMEOUT_SECS,
            download_dir: std::env::temp_dir().join("relaycast"),
            ffmpeg_location: None,
            gateway_url: "http://127.0.0.1:8090".to_string(),
            gateway_timeout_secs: GATEWAY_TIMEOUT_SECS,
            gateway_token: None,
            assistant_handle: "@RelayCastAssistant".to_string(),
            invite_link_base: "https://t.me/".to_string(),
            queue_listing_limit: DEFAULT_QUEUE_LISTING_LIMIT,
            diagnostic_max_chars: DIAGNOSTIC_MAX_CHARS,
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
            api_secret: None,
            trusted_origins: vec![
                "http://localhost".to_string(),
                "http://127.0.0.1".to_string(),
            ],
        }
    }
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.resolver_program.trim().is_empty() {
            return Err("resolver_program must not be empty".to_string());
        }
        if self.resolve_timeout_secs == 0 {
            return Err("resolve_timeout_secs must be >= 1".to_string());
        }
        if self.gateway_timeout_secs == 0 {
            return Err("gateway_timeout_secs must be >= 1".to_string());
        }
        if !(self.gateway_url.starts_with("http://") || self.gateway_url.starts_with("https://"))
        {
            return Err(format!(
                "gateway_url must be an http(s) URL, got {:?}",
                self.gateway_url
            ));
        }
        if self.assistant_handle.trim().trim_start_matches('@').is_empty() {
            return Err("assistant_handle must not be empty".to_string());
        }
        if self.queue_listing_limit == 0 {
            return Err("queue_listing_limit must be >= 1".to_string());
        }
        if self.diagnostic_max_chars == 0 {
            return Err("diagnostic_max_chars must be >= 1".to_string());
        }
        if self.event_channel_capacity == 0 {
            return Err(
                "event_channel_capacity must be >= 1 (broadcast::channel panics on 0)".to_string(),
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    #[must_use]
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    #[must_use]
    pub fn yt_dlp(&self) -> YtDlpConfig {
        YtDlpConfig {
            program: self.resolver_program.clone(),
            leading_args: self.resolver_args.clone(),
            download_dir: self.download_dir.clone(),
            ffmpeg_location: self.ffmpeg_location.clone(),
        }
    }

    #[must_use]
    pub fn assistant_contact(&self) -> AssistantContact {
        AssistantContact::new(&self.assistant_handle, &self.invite_link_base)
    }
}
