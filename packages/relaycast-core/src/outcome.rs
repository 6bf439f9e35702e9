//! Results of handled requests.
//!
//! Every request produces exactly one [`PlaybackOutcome`]. Failures are
//! ordinary outcomes carrying a [`FailureKind`] and a short diagnostic; they
//! never escape as errors.

use serde::Serialize;

use crate::services::{render_listing, QueueEntry, StatusReport};

/// Classification of failed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Request came from a chat that cannot host a group call.
    NotAGroupContext,
    /// The driving account is not a member of the group.
    AssistantNotPresent,
    ResolutionNotFound,
    /// Download/conversion error or timeout.
    ResolutionFailed,
    /// Joining or streaming into the call failed; the track stays current.
    CallJoinFailed,
    /// Unexpected fault inside one handler.
    Internal,
}

impl FailureKind {
    /// Machine-readable code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::NotAGroupContext => "not_a_group_context",
            Self::AssistantNotPresent => "assistant_not_present",
            Self::ResolutionNotFound => "resolution_not_found",
            Self::ResolutionFailed => "resolution_failed",
            Self::CallJoinFailed => "call_join_failed",
            Self::Internal => "internal_error",
        }
    }

    fn headline(self) -> &'static str {
        match self {
            Self::NotAGroupContext => "This command only works inside a group.",
            Self::AssistantNotPresent => "The assistant account is not in this group yet.",
            Self::ResolutionNotFound => "Nothing found for that request.",
            Self::ResolutionFailed => "Could not fetch that track.",
            Self::CallJoinFailed => {
                "Could not join or play in the voice chat. Check that the voice chat is \
                 started and the assistant is allowed to join it."
            }
            Self::Internal => "Operation failed.",
        }
    }
}

/// Outcome of one handled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PlaybackOutcome {
    /// The track became current and the call is streaming it.
    #[serde(rename_all = "camelCase")]
    Playing { display_name: String },
    /// The track was appended behind the current one.
    #[serde(rename_all = "camelCase")]
    Queued { position: usize, display_name: String },
    #[serde(rename_all = "camelCase")]
    Skipped { now_playing: String },
    /// Skip (or end of track) with nothing left to play; the call was left.
    StoppedQueueEmpty,
    StoppedAndCleared { released: usize },
    NothingToSkip,
    QueueEmpty,
    Status(StatusReport),
    QueueListing { entries: Vec<QueueEntry> },
    /// Static guide text (setup, help).
    Guide { text: String },
    /// The request lacked its argument.
    Usage { text: String },
    /// End-of-track for a track that is no longer current.
    Ignored,
    Failed {
        kind: FailureKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        diagnostic: Option<String>,
    },
}

impl PlaybackOutcome {
    pub fn failed(kind: FailureKind, diagnostic: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn failed_bare(kind: FailureKind) -> Self {
        Self::Failed {
            kind,
            diagnostic: None,
        }
    }

    /// `false` for failures and usage errors.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. } | Self::Usage { .. })
    }

    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Playing { .. } => "playing",
            Self::Queued { .. } => "queued",
            Self::Skipped { .. } => "skipped",
            Self::StoppedQueueEmpty => "stopped_queue_empty",
            Self::StoppedAndCleared { .. } => "stopped_and_cleared",
            Self::NothingToSkip | Self::QueueEmpty => "nothing_queued",
            Self::Status(_) => "status",
            Self::QueueListing { .. } => "queue",
            Self::Guide { .. } => "guide",
            Self::Usage { .. } => "missing_query",
            Self::Ignored => "ignored",
            Self::Failed { kind, .. } => kind.code(),
        }
    }

    /// Human-facing text.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Playing { display_name } => format!("▶ Playing: {display_name}"),
            Self::Queued {
                position,
                display_name,
            } => format!("+ Queued #{position}: {display_name}"),
            Self::Skipped { now_playing } => format!("⏭ Skipped. Now playing: {now_playing}"),
            Self::StoppedQueueEmpty => "⏹ Stopped (queue empty)".to_string(),
            Self::StoppedAndCleared { .. } => "⏹ Stopped and cleared the queue".to_string(),
            Self::NothingToSkip => "Nothing to skip, the queue is empty".to_string(),
            Self::QueueEmpty => "The queue is empty".to_string(),
            Self::Status(report) => report.render(),
            Self::QueueListing { entries } => render_listing(entries),
            Self::Guide { text } | Self::Usage { text } => text.clone(),
            Self::Ignored => String::new(),
            Self::Failed { kind, diagnostic } => match diagnostic {
                Some(d) => format!("{}\n{}", kind.headline(), d),
                None => kind.headline().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_not_success() {
        let out = PlaybackOutcome::failed(FailureKind::ResolutionFailed, "ERROR: boom");
        assert!(!out.is_success());
        assert_eq!(out.code(), "resolution_failed");
        assert!(out.message().contains("ERROR: boom"));
        assert_eq!(out.failure_kind(), Some(FailureKind::ResolutionFailed));

        assert!(PlaybackOutcome::NothingToSkip.is_success());
        assert_eq!(PlaybackOutcome::NothingToSkip.code(), "nothing_queued");
    }

    #[test]
    fn outcomes_serialize_with_tag() {
        let json = serde_json::to_value(PlaybackOutcome::Queued {
            position: 3,
            display_name: "c.mp3".into(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "queued");
        assert_eq!(json["position"], 3);
        assert_eq!(json["displayName"], "c.mp3");

        let json = serde_json::to_value(PlaybackOutcome::failed_bare(FailureKind::Internal)).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["kind"], "internal");
        assert!(json.get("diagnostic").is_none());
    }

    #[test]
    fn messages_name_the_track() {
        let out = PlaybackOutcome::Skipped {
            now_playing: "b.mp3".into(),
        };
        assert!(out.message().contains("b.mp3"));
    }
}
