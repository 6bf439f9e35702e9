//! Per-group playback orchestration.
//!
//! The [`PlaybackController`] turns inbound [`RelayRequest`]s into queue
//! mutations and call transitions. Each group owns one [`GroupSlot`] behind an
//! async mutex, so all mutations to a group's queue and call are serialized
//! while different groups proceed concurrently.
//!
//! Resolution (the slow download step) runs before the group lock is taken.
//! Concurrent play requests for one group therefore enter the queue in the
//! order their resolutions complete.

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::Mutex;

use crate::error::ErrorCode;
use crate::events::{CallEvent, EventEmitter, PlaybackEvent};
use crate::outcome::{FailureKind, PlaybackOutcome};
use crate::platform::{GroupDirectory, GroupId, VoiceCallClient};
use crate::request::{RelayRequest, RequestContext};
use crate::resolver::{ArtifactResolver, ResolveError};
use crate::services::call_session::{CallError, CallSession, CallState};
use crate::services::group_queue::{GroupQueue, QueueSnapshot};
use crate::services::presence_gate::PresenceGate;
use crate::services::status_reporter::StatusReporter;
use crate::state::Config;
use crate::utils::{normalize_query, now_millis, truncate_chars};

/// Usage text returned for a play request without a query.
const PLAY_USAGE: &str = "Usage: /play <song name> or /play <URL>";

/// Tunables the controller reads on every request.
#[derive(Debug, Clone)]
pub struct PlaybackSettings {
    /// Upper bound on one resolution; exceeding it is a resolution failure.
    pub resolve_timeout: Duration,
    /// Maximum characters of a diagnostic placed in an outcome.
    pub diagnostic_max_chars: usize,
}

impl From<&Config> for PlaybackSettings {
    fn from(config: &Config) -> Self {
        Self {
            resolve_timeout: config.resolve_timeout(),
            diagnostic_max_chars: config.diagnostic_max_chars,
        }
    }
}

/// Queue plus call session of one group.
struct GroupSlot {
    queue: GroupQueue,
    call: CallSession,
}

/// Orchestrates playback across all groups.
pub struct PlaybackController {
    groups: DashMap<GroupId, Arc<Mutex<GroupSlot>>>,
    resolver: Arc<dyn ArtifactResolver>,
    gate: Arc<PresenceGate>,
    calls: Arc<dyn VoiceCallClient>,
    directory: Arc<dyn GroupDirectory>,
    emitter: Arc<dyn EventEmitter>,
    reporter: StatusReporter,
    settings: PlaybackSettings,
}

impl PlaybackController {
    pub fn new(
        resolver: Arc<dyn ArtifactResolver>,
        gate: Arc<PresenceGate>,
        calls: Arc<dyn VoiceCallClient>,
        directory: Arc<dyn GroupDirectory>,
        emitter: Arc<dyn EventEmitter>,
        reporter: StatusReporter,
        settings: PlaybackSettings,
    ) -> Self {
        Self {
            groups: DashMap::new(),
            resolver,
            gate,
            calls,
            directory,
            emitter,
            reporter,
            settings,
        }
    }

    /// Handles one request and reports its outcome.
    ///
    /// Never fails: unexpected faults (including panics) inside a handler
    /// become an `Internal` outcome and only affect that request's group.
    pub async fn handle(&self, request: RelayRequest) -> PlaybackOutcome {
        let name = request.name();
        let group = request.group_id();

        match AssertUnwindSafe(self.dispatch(request)).catch_unwind().await {
            Ok(outcome) => {
                log::debug!(
                    "[Playback] {} in group {:?} -> {}",
                    name,
                    group,
                    outcome.code()
                );
                outcome
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!(
                    "[Playback] {} in group {:?} panicked: {}",
                    name,
                    group,
                    detail
                );
                PlaybackOutcome::failed_bare(FailureKind::Internal)
            }
        }
    }

    async fn dispatch(&self, request: RelayRequest) -> PlaybackOutcome {
        match request {
            RelayRequest::Play { ctx, text } => self.play(ctx, &text).await,
            RelayRequest::Skip { ctx } => self.skip(ctx).await,
            RelayRequest::Stop { ctx } => self.stop(ctx).await,
            RelayRequest::Status { ctx } => self.status(ctx).await,
            RelayRequest::Queue { ctx } => self.queue(ctx).await,
            RelayRequest::Setup { ctx } => self.setup(ctx),
            RelayRequest::Help => PlaybackOutcome::Guide {
                text: self.reporter.help_text(),
            },
            RelayRequest::TrackEnded { group_id, source } => {
                self.track_ended(group_id, &source).await
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request handlers
    // ─────────────────────────────────────────────────────────────────────────

    async fn play(&self, ctx: RequestContext, text: &str) -> PlaybackOutcome {
        if !ctx.chat_kind.is_multi_party_group() {
            return PlaybackOutcome::failed_bare(FailureKind::NotAGroupContext);
        }

        let query = normalize_query(text);
        if query.is_empty() {
            return PlaybackOutcome::Usage {
                text: PLAY_USAGE.to_string(),
            };
        }

        let group_id = ctx.group_id;
        if !self.gate.is_member(group_id).await {
            return PlaybackOutcome::failed(
                FailureKind::AssistantNotPresent,
                self.reporter.contact().invite_hint(),
            );
        }

        let artifact = match self.resolve(&query).await {
            Ok(artifact) => artifact,
            Err(e) => {
                log::info!(
                    "[Playback] Resolution for group {} failed ({}): {}",
                    group_id,
                    e.code(),
                    e
                );
                let kind = match e {
                    ResolveError::NotFound(_) => FailureKind::ResolutionNotFound,
                    ResolveError::Failed(_) => FailureKind::ResolutionFailed,
                };
                return PlaybackOutcome::failed(kind, self.diagnostic(e.diagnostic()));
            }
        };

        let slot = self.slot(group_id);
        let mut guard = slot.lock().await;
        let GroupSlot { queue, call } = &mut *guard;

        let display_name = artifact.display_name().to_string();
        let was_idle = queue.is_empty();
        let position = queue.enqueue(artifact);

        if !was_idle {
            log::info!(
                "[Playback] Queued {} at #{} in group {}",
                display_name,
                position,
                group_id
            );
            self.emitter.emit_playback(PlaybackEvent::Enqueued {
                group_id,
                position,
                display_name: display_name.clone(),
                timestamp: now_millis(),
            });
            return PlaybackOutcome::Queued {
                position,
                display_name,
            };
        }

        match self.start_next(group_id, queue, call).await {
            Some(Ok(now_playing)) => PlaybackOutcome::Playing {
                display_name: now_playing,
            },
            Some(Err(e)) => self.join_failed(&e),
            None => PlaybackOutcome::failed_bare(FailureKind::Internal),
        }
    }

    async fn skip(&self, ctx: RequestContext) -> PlaybackOutcome {
        if !ctx.chat_kind.is_multi_party_group() {
            return PlaybackOutcome::failed_bare(FailureKind::NotAGroupContext);
        }

        let Some(slot) = self.existing_slot(ctx.group_id) else {
            return PlaybackOutcome::NothingToSkip;
        };
        let mut guard = slot.lock().await;
        if guard.queue.is_empty() {
            return PlaybackOutcome::NothingToSkip;
        }

        match self.advance_past_current(ctx.group_id, &mut guard).await {
            Some(Ok(now_playing)) => PlaybackOutcome::Skipped { now_playing },
            Some(Err(e)) => self.join_failed(&e),
            None => PlaybackOutcome::StoppedQueueEmpty,
        }
    }

    async fn track_ended(&self, group_id: GroupId, source: &Path) -> PlaybackOutcome {
        let Some(slot) = self.existing_slot(group_id) else {
            return PlaybackOutcome::Ignored;
        };
        let mut guard = slot.lock().await;
        let is_current = guard
            .queue
            .current()
            .is_some_and(|current| current.path() == source);
        if !is_current {
            log::debug!(
                "[Playback] Stale track end for {} in group {} ignored",
                source.display(),
                group_id
            );
            return PlaybackOutcome::Ignored;
        }

        match self.advance_past_current(group_id, &mut guard).await {
            Some(Ok(now_playing)) => PlaybackOutcome::Playing {
                display_name: now_playing,
            },
            Some(Err(e)) => self.join_failed(&e),
            None => PlaybackOutcome::StoppedQueueEmpty,
        }
    }

    async fn stop(&self, ctx: RequestContext) -> PlaybackOutcome {
        if !ctx.chat_kind.is_multi_party_group() {
            return PlaybackOutcome::failed_bare(FailureKind::NotAGroupContext);
        }

        let slot = self.slot(ctx.group_id);
        let mut guard = slot.lock().await;
        let released = self.clear_and_leave(ctx.group_id, &mut guard).await;
        PlaybackOutcome::StoppedAndCleared { released }
    }

    async fn status(&self, ctx: RequestContext) -> PlaybackOutcome {
        if !ctx.chat_kind.is_multi_party_group() {
            return PlaybackOutcome::failed_bare(FailureKind::NotAGroupContext);
        }

        // Presence lookup does network I/O; keep it outside the group lock
        let present = self.gate.is_member(ctx.group_id).await;
        let (snapshot, call_state) = self.observe(ctx.group_id).await;
        PlaybackOutcome::Status(
            self.reporter
                .report(ctx.group_id, present, &snapshot, call_state),
        )
    }

    async fn queue(&self, ctx: RequestContext) -> PlaybackOutcome {
        if !ctx.chat_kind.is_multi_party_group() {
            return PlaybackOutcome::failed_bare(FailureKind::NotAGroupContext);
        }

        let (snapshot, _) = self.observe(ctx.group_id).await;
        if snapshot.is_empty() {
            return PlaybackOutcome::QueueEmpty;
        }
        PlaybackOutcome::QueueListing {
            entries: self.reporter.listing(&snapshot),
        }
    }

    fn setup(&self, ctx: RequestContext) -> PlaybackOutcome {
        if !ctx.chat_kind.is_multi_party_group() {
            return PlaybackOutcome::failed_bare(FailureKind::NotAGroupContext);
        }
        PlaybackOutcome::Guide {
            text: self.reporter.setup_text(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Releases every artifact of every group and leaves every call.
    ///
    /// Returns the number of artifacts released.
    pub async fn shutdown_sweep(&self) -> usize {
        let slots: Vec<(GroupId, Arc<Mutex<GroupSlot>>)> = self
            .groups
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut released = 0;
        for (group_id, slot) in slots {
            let mut guard = slot.lock().await;
            released += self.clear_and_leave(group_id, &mut guard).await;
        }

        log::info!(
            "[Playback] Shutdown sweep released {} artifact(s)",
            released
        );
        released
    }

    /// Read-only view of a group's queue, if the group has been seen.
    pub async fn snapshot(&self, group_id: GroupId) -> Option<QueueSnapshot> {
        let slot = self.existing_slot(group_id)?;
        let guard = slot.lock().await;
        Some(guard.queue.snapshot())
    }

    /// Number of groups with state.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    async fn resolve(&self, query: &str) -> Result<crate::artifact::Artifact, ResolveError> {
        let timeout = self.settings.resolve_timeout;
        match tokio::time::timeout(timeout, self.resolver.resolve(query)).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::failed(format!(
                "timed out after {}s",
                timeout.as_secs()
            ))),
        }
    }

    /// Get-or-create the slot for a group.
    fn slot(&self, group_id: GroupId) -> Arc<Mutex<GroupSlot>> {
        self.groups
            .entry(group_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(GroupSlot {
                    queue: GroupQueue::new(),
                    call: CallSession::new(
                        group_id,
                        Arc::clone(&self.calls),
                        Arc::clone(&self.directory),
                    ),
                }))
            })
            .clone()
    }

    fn existing_slot(&self, group_id: GroupId) -> Option<Arc<Mutex<GroupSlot>>> {
        self.groups.get(&group_id).map(|slot| Arc::clone(&slot))
    }

    async fn observe(&self, group_id: GroupId) -> (QueueSnapshot, CallState) {
        match self.existing_slot(group_id) {
            Some(slot) => {
                let guard = slot.lock().await;
                (guard.queue.snapshot(), guard.call.state())
            }
            None => (QueueSnapshot::default(), CallState::Idle),
        }
    }

    /// Promotes the head of the queue and streams it.
    ///
    /// Returns `None` when there is nothing to promote. On a call failure the
    /// promoted artifact stays current.
    async fn start_next(
        &self,
        group_id: GroupId,
        queue: &mut GroupQueue,
        call: &mut CallSession,
    ) -> Option<Result<String, CallError>> {
        let current = queue.advance()?;
        let display_name = current.display_name().to_string();

        let result = call.start_or_change(current).await;
        match &result {
            Ok(()) => {
                log::info!("[Playback] Group {} playing {}", group_id, display_name);
                self.emitter.emit_playback(PlaybackEvent::TrackStarted {
                    group_id,
                    display_name: display_name.clone(),
                    timestamp: now_millis(),
                });
            }
            Err(e) => {
                let CallError::JoinFailed(cause) = e;
                self.emitter.emit_call(CallEvent::JoinFailed {
                    group_id,
                    code: cause.code(),
                    error: self.diagnostic(&e.to_string()),
                    timestamp: now_millis(),
                });
            }
        }
        Some(result.map(|()| display_name))
    }

    /// Drops the current track and moves on: streams the next pending track,
    /// or leaves the call when there is none (`None`).
    async fn advance_past_current(
        &self,
        group_id: GroupId,
        slot: &mut GroupSlot,
    ) -> Option<Result<String, CallError>> {
        let GroupSlot { queue, call } = slot;
        queue.remove_current();

        if queue.peek_head().is_none() {
            call.leave().await;
            log::info!("[Playback] Queue finished in group {}", group_id);
            self.emitter.emit_playback(PlaybackEvent::QueueFinished {
                group_id,
                timestamp: now_millis(),
            });
            self.emitter.emit_call(CallEvent::Left {
                group_id,
                timestamp: now_millis(),
            });
            return None;
        }

        self.start_next(group_id, queue, call).await
    }

    async fn clear_and_leave(&self, group_id: GroupId, slot: &mut GroupSlot) -> usize {
        let released = slot.queue.clear();
        slot.call.leave().await;
        log::info!(
            "[Playback] Cleared {} artifact(s) and left call in group {}",
            released,
            group_id
        );
        self.emitter.emit_playback(PlaybackEvent::QueueCleared {
            group_id,
            released,
            timestamp: now_millis(),
        });
        self.emitter.emit_call(CallEvent::Left {
            group_id,
            timestamp: now_millis(),
        });
        released
    }

    fn join_failed(&self, err: &CallError) -> PlaybackOutcome {
        let CallError::JoinFailed(source) = err;
        PlaybackOutcome::failed(
            FailureKind::CallJoinFailed,
            self.diagnostic(&source.to_string()),
        )
    }

    fn diagnostic(&self, text: &str) -> String {
        truncate_chars(text.trim(), self.settings.diagnostic_max_chars)
    }
}
