//! RelayCast Core - playback orchestration for group voice-chat music relays.
//!
//! Users in a group chat ask for a track by search text or URL. The relay
//! resolves the request to a local audio artifact, queues it per group and
//! streams it into the group's live voice call through a driving account.
//!
//! # Architecture
//!
//! - [`services`]: Per-group queues, call sessions, presence checks, status text
//!   and the [`PlaybackController`] that ties them together
//! - [`resolver`]: Turning a request into a local audio file (`yt-dlp`)
//! - [`platform`]: The voice-call gateway (join, change stream, leave, membership)
//! - [`events`]: Event system for real-time client communication
//! - [`api`]: HTTP surface and Server-Sent Events stream
//! - [`state`]: Core configuration
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! - [`ArtifactResolver`](resolver::ArtifactResolver): Resolving requests to files
//! - [`VoiceCallClient`](platform::VoiceCallClient) and
//!   [`GroupDirectory`](platform::GroupDirectory): Call layer access
//! - [`EventEmitter`](events::EventEmitter): Emitting domain events
//! - [`TaskSpawner`](runtime::TaskSpawner): Running requests and startup work detached

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod artifact;
pub mod bootstrap;
pub mod error;
pub mod events;
pub mod outcome;
pub mod platform;
pub mod protocol_constants;
pub mod request;
pub mod resolver;
pub mod runtime;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types at the crate root
pub use artifact::{Artifact, ArtifactSummary};
pub use error::{ErrorCode, RelayError, RelayResult};
pub use events::{
    BroadcastEvent, BroadcastEventBridge, CallEvent, EventEmitter, LoggingEventEmitter,
    PlaybackEvent,
};
pub use outcome::{FailureKind, PlaybackOutcome};
pub use request::{RelayRequest, RequestContext};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use state::Config;
pub use utils::now_millis;

// Re-export platform types
pub use platform::{AccountId, CallGatewayClient, ChatKind, GroupId, PlatformError};

// Re-export resolver types
pub use resolver::{ArtifactResolver, ResolveError, YtDlpResolver};

// Re-export service types
pub use services::{CallState, PlaybackController, QueueSnapshot, StatusReport};

// Re-export bootstrap types
pub use bootstrap::{bootstrap_services, bootstrap_services_with, BootstrappedServices};

// Re-export API types
pub use api::{serve, start_server, AppState, ServerError};
