//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to.
    /// Override: `RELAYCAST_BIND_PORT`
    pub bind_port: u16,

    /// Address to bind the HTTP server to.
    /// Override: `RELAYCAST_BIND_ADDRESS`
    pub bind_address: IpAddr,

    /// Base URL of the call gateway driving the assistant account.
    /// Override: `RELAYCAST_GATEWAY_URL`
    pub gateway_url: String,

    /// Bearer token for the call gateway.
    pub gateway_token: Option<String>,

    /// Downloader program used to resolve requests.
    pub resolver_program: String,

    /// Upper bound on a single resolution, in seconds.
    /// Override: `RELAYCAST_RESOLVE_TIMEOUT`
    pub resolve_timeout_secs: u64,

    /// Directory receiving downloaded audio.
    pub download_dir: Option<PathBuf>,

    /// Explicit ffmpeg binary or directory for the downloader.
    pub ffmpeg_location: Option<PathBuf>,

    /// Public handle of the assistant account.
    pub assistant_handle: String,

    /// Maximum entries shown in a queue listing.
    pub queue_listing_limit: usize,

    /// Shared secret required on API requests.
    pub api_secret: Option<String>,

    /// Origin prefixes allowed by CORS.
    pub trusted_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = relaycast_core::Config::default();
        Self {
            bind_port: 8080,
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            gateway_url: core.gateway_url,
            gateway_token: None,
            resolver_program: core.resolver_program,
            resolve_timeout_secs: core.resolve_timeout_secs,
            download_dir: None,
            ffmpeg_location: None,
            assistant_handle: core.assistant_handle,
            queue_listing_limit: core.queue_listing_limit,
            api_secret: None,
            trusted_origins: core.trusted_origins,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("RELAYCAST_BIND_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("RELAYCAST_BIND_ADDRESS") {
            if let Ok(ip) = val.parse() {
                self.bind_address = ip;
            }
        }

        if let Ok(val) = std::env::var("RELAYCAST_GATEWAY_URL") {
            self.gateway_url = val;
        }

        if let Ok(val) = std::env::var("RELAYCAST_RESOLVE_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.resolve_timeout_secs = secs;
            }
        }

        // Secrets and the download dir are handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Converts to relaycast-core's Config type.
    pub fn to_core_config(&self) -> relaycast_core::Config {
        let defaults = relaycast_core::Config::default();
        relaycast_core::Config {
            resolver_program: self.resolver_program.clone(),
            resolve_timeout_secs: self.resolve_timeout_secs,
            download_dir: self
                .download_dir
                .clone()
                .unwrap_or(defaults.download_dir.clone()),
            ffmpeg_location: self.ffmpeg_location.clone(),
            gateway_url: self.gateway_url.clone(),
            gateway_token: self.gateway_token.clone(),
            assistant_handle: self.assistant_handle.clone(),
            queue_listing_limit: self.queue_listing_limit,
            api_secret: self.api_secret.clone(),
            trusted_origins: self.trusted_origins.clone(),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_bind_loopback() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(config.api_secret.is_none());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bind_port: 9000\ngateway_url: http://10.0.0.5:8090\napi_secret: hunter2"
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.gateway_url, "http://10.0.0.5:8090");
        assert_eq!(config.api_secret.as_deref(), Some("hunter2"));
        assert_eq!(config.resolver_program, "yt-dlp");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bind_port: [not, a, port]").unwrap();

        let err = ServerConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = ServerConfig::from_file(Path::new("/nonexistent/relaycast.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn core_config_carries_overrides() {
        let config = ServerConfig {
            download_dir: Some(PathBuf::from("/var/cache/relaycast")),
            resolve_timeout_secs: 60,
            ..ServerConfig::default()
        };

        let core = config.to_core_config();
        assert_eq!(core.download_dir, PathBuf::from("/var/cache/relaycast"));
        assert_eq!(core.resolve_timeout_secs, 60);
        assert!(core.validate().is_ok());
    }
}
