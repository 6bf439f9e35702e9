//! Inbound requests handled by the playback controller.
//!
//! Transports (chat bot, HTTP, tests) translate whatever they receive into a
//! [`RelayRequest`]; the controller never sees transport details.

use std::path::PathBuf;

use serde::Deserialize;

use crate::platform::{ChatKind, GroupId};

/// Where a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub group_id: GroupId,
    pub chat_kind: ChatKind,
}

impl RequestContext {
    pub fn new(group_id: GroupId, chat_kind: ChatKind) -> Self {
        Self {
            group_id,
            chat_kind,
        }
    }
}

/// A request for the playback controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRequest {
    /// Resolve `text` and queue (or start) it.
    Play { ctx: RequestContext, text: String },
    /// Drop the current track and start the next one.
    Skip { ctx: RequestContext },
    /// Clear the queue and leave the call.
    Stop { ctx: RequestContext },
    Status { ctx: RequestContext },
    /// List the queue, current first.
    Queue { ctx: RequestContext },
    Setup { ctx: RequestContext },
    Help,
    /// The call layer finished streaming `source`.
    ///
    /// Ignored unless `source` is still the group's current track.
    TrackEnded { group_id: GroupId, source: PathBuf },
}

impl RelayRequest {
    /// Target group, if the request addresses one.
    #[must_use]
    pub fn group_id(&self) -> Option<GroupId> {
        match self {
            Self::Play { ctx, .. }
            | Self::Skip { ctx }
            | Self::Stop { ctx }
            | Self::Status { ctx }
            | Self::Queue { ctx }
            | Self::Setup { ctx } => Some(ctx.group_id),
            Self::Help => None,
            Self::TrackEnded { group_id, .. } => Some(*group_id),
        }
    }

    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Skip { .. } => "skip",
            Self::Stop { .. } => "stop",
            Self::Status { .. } => "status",
            Self::Queue { .. } => "queue",
            Self::Setup { .. } => "setup",
            Self::Help => "help",
            Self::TrackEnded { .. } => "track_ended",
        }
    }
}
