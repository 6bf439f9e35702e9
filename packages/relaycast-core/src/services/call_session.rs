//! Per-group voice-call session.
//!
//! Wraps the live call client with an explicit state machine:
//!
//! ```text
//! Idle ──join──▶ Joining ──ok──▶ Streaming ──change──▶ Streaming
//!   ▲               │                │
//!   └──── fail ─────┴──── leave ─────┘
//! ```
//!
//! A failed change-stream is classified as "not joined" and falls back to a
//! join; only the join failure is surfaced.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::artifact::Artifact;
use crate::platform::{GroupDirectory, GroupId, PlatformError, VoiceCallClient};

/// Lifecycle of the driving account's presence in a group call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    #[default]
    Idle,
    Joining,
    Streaming,
}

/// Errors surfaced by call session transitions.
#[derive(Debug, Error)]
pub enum CallError {
    /// Joining the call (directly or as change-stream fallback) failed.
    #[error("Joining the voice chat failed: {0}")]
    JoinFailed(#[source] PlatformError),
}

/// Convenient Result alias for call session operations.
pub type CallResult<T> = Result<T, CallError>;

/// Live call state for one group.
///
/// Not synchronized; the owning group's lock serializes all transitions.
pub struct CallSession {
    group_id: GroupId,
    client: Arc<dyn VoiceCallClient>,
    directory: Arc<dyn GroupDirectory>,
    state: CallState,
}

impl CallSession {
    pub fn new(
        group_id: GroupId,
        client: Arc<dyn VoiceCallClient>,
        directory: Arc<dyn GroupDirectory>,
    ) -> Self {
        Self {
            group_id,
            client,
            directory,
            state: CallState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Best-effort warm-up of the group's addressing on the call layer.
    ///
    /// Failures are swallowed; the following join/change surfaces real errors.
    pub async fn ensure_reachable(&self) {
        if let Err(e) = self.directory.warm_up(self.group_id).await {
            log::debug!(
                "[CallSession] Warm-up for group {} failed (ignored): {}",
                self.group_id,
                e
            );
        }
    }

    /// Streams `artifact` into the group's call.
    ///
    /// Streaming sessions swap the source in place; idle sessions join. A
    /// failed swap is treated as "not joined" and retried as a join.
    pub async fn start_or_change(&mut self, artifact: &Artifact) -> CallResult<()> {
        self.ensure_reachable().await;
        let source = artifact.path();

        if self.state == CallState::Streaming {
            match self.client.change_stream(self.group_id, source).await {
                Ok(()) => {
                    log::info!(
                        "[CallSession] Group {} now streaming {}",
                        self.group_id,
                        artifact.display_name()
                    );
                    return Ok(());
                }
                Err(e) => {
                    log::info!(
                        "[CallSession] Change-stream in group {} failed, rejoining: {}",
                        self.group_id,
                        e
                    );
                    self.state = CallState::Idle;
                }
            }
        }

        self.state = CallState::Joining;
        match self.client.join_call(self.group_id, source).await {
            Ok(()) => {
                self.state = CallState::Streaming;
                log::info!(
                    "[CallSession] Joined group {} streaming {}",
                    self.group_id,
                    artifact.display_name()
                );
                Ok(())
            }
            Err(e) => {
                self.state = CallState::Idle;
                log::warn!(
                    "[CallSession] Join in group {} failed: {}",
                    self.group_id,
                    e
                );
                Err(CallError::JoinFailed(e))
            }
        }
    }

    /// Leaves the call. Leaving a call that was never joined is not an error.
    pub async fn leave(&mut self) {
        if let Err(e) = self.client.leave_call(self.group_id).await {
            log::debug!(
                "[CallSession] Leave in group {} failed (ignored): {}",
                self.group_id,
                e
            );
        }
        self.state = CallState::Idle;
    }
}
