//! Driving-account presence checks.
//!
//! Playback is only attempted in groups the driving account belongs to.
//! Membership is looked up live on every check and any lookup failure is
//! treated as "not a member".

use std::sync::Arc;

use parking_lot::RwLock;

use crate::platform::{AccountId, GroupDirectory, GroupId};

/// Gate deciding whether the driving account can join a group's call.
pub struct PresenceGate {
    directory: Arc<dyn GroupDirectory>,
    /// Identity of the driving account, once known.
    account: RwLock<Option<AccountId>>,
}

impl PresenceGate {
    pub fn new(directory: Arc<dyn GroupDirectory>) -> Self {
        Self {
            directory,
            account: RwLock::new(None),
        }
    }

    /// Fetches and stores the driving account identity.
    ///
    /// Called at startup. Failure leaves the identity unknown, which makes
    /// every gate check fail closed until a later lookup succeeds.
    pub async fn refresh_identity(&self) -> Option<AccountId> {
        match self.directory.whoami().await {
            Ok(id) => {
                log::info!("[Presence] Driving account id={}", id);
                *self.account.write() = Some(id);
                Some(id)
            }
            Err(e) => {
                log::warn!("[Presence] Could not determine driving account: {}", e);
                None
            }
        }
    }

    /// The driving account identity, if known.
    #[must_use]
    pub fn account(&self) -> Option<AccountId> {
        *self.account.read()
    }

    /// Returns `true` only if the driving account is currently a member of the group.
    pub async fn is_member(&self, group_id: GroupId) -> bool {
        let account = match self.account() {
            Some(id) => id,
            None => match self.refresh_identity().await {
                Some(id) => id,
                None => return false,
            },
        };

        if let Err(e) = self.directory.warm_up(group_id).await {
            log::debug!("[Presence] Warm-up for group {} failed: {}", group_id, e);
        }

        match self.directory.is_member(group_id, account).await {
            Ok(member) => member,
            Err(e) => {
                log::debug!(
                    "[Presence] Membership lookup for group {} failed, treating as absent: {}",
                    group_id,
                    e
                );
                false
            }
        }
    }
}
