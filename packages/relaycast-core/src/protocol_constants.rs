//! Fixed constants shared across the relay.
//!
//! Tunable values live in [`crate::state::Config`]; the values here are part
//! of the user-facing contract or the wire format and should not be changed
//! casually.

// ─────────────────────────────────────────────────────────────────────────────
// User-facing Text
// ─────────────────────────────────────────────────────────────────────────────

/// Maximum characters of an internal diagnostic shown to end users.
pub const DIAGNOSTIC_MAX_CHARS: usize = 180;

/// Placeholder rendered when there is no display name (nothing playing).
pub const NO_DISPLAY_NAME: &str = "—";

/// Default number of queue entries listed by a queue request.
pub const DEFAULT_QUEUE_LISTING_LIMIT: usize = 20;

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Search prefix asking the downloader for the single best search result.
pub const SEARCH_FIRST_RESULT_PREFIX: &str = "ytsearch1:";

/// Output filename template: title truncated to 80 chars plus the source id.
pub const OUTPUT_TEMPLATE: &str = "%(title).80s_%(id)s.%(ext)s";

/// Audio container produced for every resolved artifact.
pub const ARTIFACT_EXTENSION: &str = "mp3";

/// Default upper bound on a single resolution (seconds).
pub const DEFAULT_RESOLVE_TIMEOUT_SECS: u64 = 180;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP
// ─────────────────────────────────────────────────────────────────────────────

/// Timeout for call gateway HTTP requests (seconds).
pub const GATEWAY_TIMEOUT_SECS: u64 = 15;

/// Header carrying the shared secret on inbound API requests.
pub const SECRET_HEADER: &str = "X-Relay-Secret";

/// Capacity of the broadcast channel for playback events.
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Application Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Application name used in logs and API responses.
pub const APP_NAME: &str = "RelayCast";

/// Service identifier returned by the health endpoint.
pub const SERVICE_ID: &str = "relaycast-server";
