//! Trait abstractions for voice-call platform operations.
//!
//! These traits enable dependency injection for testability and modularity.
//! Services depend on traits rather than concrete implementations.

use std::path::Path;

use async_trait::async_trait;

use crate::platform::error::PlatformResult;
use crate::platform::types::{AccountId, GroupId};

/// Trait for live group-call control.
///
/// Used by `CallSession` to join, swap the audio source and leave.
#[async_trait]
pub trait VoiceCallClient: Send + Sync {
    /// Joins the group's voice call with `source` as the initial audio stream.
    ///
    /// # Arguments
    /// * `group_id` - Group whose voice call to join
    /// * `source` - Locally playable audio file
    async fn join_call(&self, group_id: GroupId, source: &Path) -> PlatformResult<()>;

    /// Swaps the audio source of an already-joined call without leaving it.
    ///
    /// Fails if the driving account is not currently in the call.
    async fn change_stream(&self, group_id: GroupId, source: &Path) -> PlatformResult<()>;

    /// Leaves the group's voice call.
    async fn leave_call(&self, group_id: GroupId) -> PlatformResult<()>;
}

/// Trait for group metadata and membership lookups.
///
/// Used by `PresenceGate` and by `CallSession` for warm-up.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Returns the identity of the driving account.
    async fn whoami(&self) -> PlatformResult<AccountId>;

    /// Preloads whatever addressing/metadata the call layer needs for a group.
    async fn warm_up(&self, group_id: GroupId) -> PlatformResult<()>;

    /// Checks whether `account` is currently a member of the group.
    async fn is_member(&self, group_id: GroupId, account: AccountId) -> PlatformResult<bool>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Combined Traits (for trait objects)
// ─────────────────────────────────────────────────────────────────────────────

/// Combined trait for all call platform operations.
#[async_trait]
pub trait CallPlatform: VoiceCallClient + GroupDirectory {}

/// Blanket implementation for any type implementing both traits.
impl<T: VoiceCallClient + GroupDirectory> CallPlatform for T {}
