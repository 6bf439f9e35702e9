//! Event system for real-time client communication.
//!
//! This module provides:
//! - [`EventEmitter`] trait for domain services to emit events
//! - [`BroadcastEventBridge`] for the Server-Sent Events transport
//! - Event types for queue and call lifecycle changes

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter};

#[cfg(test)]
pub(crate) use emitter::test_support;

use serde::Serialize;

use crate::platform::GroupId;

/// Events broadcast to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// Queue and now-playing changes.
    Playback(PlaybackEvent),

    /// Voice-call session transitions.
    Call(CallEvent),
}

/// Events related to a group's queue and now-playing state.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    /// A resolved track was appended behind the current one.
    Enqueued {
        #[serde(rename = "groupId")]
        group_id: GroupId,
        /// 1-based position including the current track.
        position: usize,
        #[serde(rename = "displayName")]
        display_name: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A track became current and was handed to the call.
    TrackStarted {
        #[serde(rename = "groupId")]
        group_id: GroupId,
        #[serde(rename = "displayName")]
        display_name: String,
        timestamp: u64,
    },
    /// The last track finished or was skipped with nothing to advance to.
    QueueFinished {
        #[serde(rename = "groupId")]
        group_id: GroupId,
        timestamp: u64,
    },
    /// The queue was cleared by a stop request or the shutdown sweep.
    QueueCleared {
        #[serde(rename = "groupId")]
        group_id: GroupId,
        /// Number of artifacts released.
        released: usize,
        timestamp: u64,
    },
}

/// Events related to the driving account's call presence.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CallEvent {
    /// Joining (or swapping the source of) the call failed.
    JoinFailed {
        #[serde(rename = "groupId")]
        group_id: GroupId,
        /// Machine-readable cause from the call layer.
        code: &'static str,
        /// Truncated diagnostic from the call layer.
        error: String,
        timestamp: u64,
    },
    /// The call was left.
    Left {
        #[serde(rename = "groupId")]
        group_id: GroupId,
        timestamp: u64,
    },
}

impl From<PlaybackEvent> for BroadcastEvent {
    fn from(event: PlaybackEvent) -> Self {
        BroadcastEvent::Playback(event)
    }
}

impl From<CallEvent> for BroadcastEvent {
    fn from(event: CallEvent) -> Self {
        BroadcastEvent::Call(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_category_and_type_tags() {
        let event: BroadcastEvent = PlaybackEvent::Enqueued {
            group_id: GroupId(-100),
            position: 2,
            display_name: "b.mp3".into(),
            timestamp: 5,
        }
        .into();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], "playback");
        assert_eq!(json["type"], "enqueued");
        assert_eq!(json["groupId"], -100);
        assert_eq!(json["displayName"], "b.mp3");
        assert_eq!(json["position"], 2);
    }

    #[test]
    fn call_events_use_call_category() {
        let event: BroadcastEvent = CallEvent::Left {
            group_id: GroupId(-7),
            timestamp: 0,
        }
        .into();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], "call");
        assert_eq!(json["type"], "left");
    }
}
