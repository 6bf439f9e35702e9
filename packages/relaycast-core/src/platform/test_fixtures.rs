//! Shared test fixtures for call platform consumers.
//!
//! [`MockPlatform`] records every call-layer interaction so tests can assert
//! on exact join/change/leave counts and the sources that were streamed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{PlatformError, PlatformResult};
use super::traits::{GroupDirectory, VoiceCallClient};
use super::types::{AccountId, GroupId};

/// A recorded call-layer interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecord {
    Join(GroupId, PathBuf),
    Change(GroupId, PathBuf),
    Leave(GroupId),
}

/// Configurable in-memory call platform.
pub struct MockPlatform {
    pub member: AtomicBool,
    pub account_known: AtomicBool,
    pub fail_join: AtomicBool,
    pub fail_change: AtomicBool,
    pub fail_leave: AtomicBool,
    pub fail_warm_up: AtomicBool,
    pub fail_membership_lookup: AtomicBool,
    pub membership_lookups: AtomicUsize,
    pub warm_ups: AtomicUsize,
    records: Mutex<Vec<CallRecord>>,
}

impl MockPlatform {
    /// A platform where the driving account is known and a group member.
    pub fn new() -> Self {
        Self {
            member: AtomicBool::new(true),
            account_known: AtomicBool::new(true),
            fail_join: AtomicBool::new(false),
            fail_change: AtomicBool::new(false),
            fail_leave: AtomicBool::new(false),
            fail_warm_up: AtomicBool::new(false),
            fail_membership_lookup: AtomicBool::new(false),
            membership_lookups: AtomicUsize::new(0),
            warm_ups: AtomicUsize::new(0),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<CallRecord> {
        self.records.lock().clone()
    }

    pub fn joins(&self) -> usize {
        self.count(|r| matches!(r, CallRecord::Join(..)))
    }

    pub fn changes(&self) -> usize {
        self.count(|r| matches!(r, CallRecord::Change(..)))
    }

    pub fn leaves(&self) -> usize {
        self.count(|r| matches!(r, CallRecord::Leave(_)))
    }

    /// Joins plus changes: every attempt to start streaming a source.
    pub fn stream_attempts(&self) -> usize {
        self.joins() + self.changes()
    }

    /// Source of the most recent join or change attempt.
    pub fn last_source(&self) -> Option<PathBuf> {
        self.records.lock().iter().rev().find_map(|r| match r {
            CallRecord::Join(_, p) | CallRecord::Change(_, p) => Some(p.clone()),
            CallRecord::Leave(_) => None,
        })
    }

    fn count(&self, pred: impl Fn(&CallRecord) -> bool) -> usize {
        self.records.lock().iter().filter(|r| pred(r)).count()
    }

    fn record(&self, record: CallRecord) {
        self.records.lock().push(record);
    }
}

#[async_trait]
impl VoiceCallClient for MockPlatform {
    async fn join_call(&self, group_id: GroupId, source: &Path) -> PlatformResult<()> {
        self.record(CallRecord::Join(group_id, source.to_path_buf()));
        if self.fail_join.load(Ordering::SeqCst) {
            return Err(PlatformError::Rejected("GROUPCALL_NOT_STARTED".into()));
        }
        Ok(())
    }

    async fn change_stream(&self, group_id: GroupId, source: &Path) -> PlatformResult<()> {
        self.record(CallRecord::Change(group_id, source.to_path_buf()));
        if self.fail_change.load(Ordering::SeqCst) {
            return Err(PlatformError::Rejected("NOT_IN_CALL".into()));
        }
        Ok(())
    }

    async fn leave_call(&self, group_id: GroupId) -> PlatformResult<()> {
        self.record(CallRecord::Leave(group_id));
        if self.fail_leave.load(Ordering::SeqCst) {
            return Err(PlatformError::HttpStatus(404, "not in call".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl GroupDirectory for MockPlatform {
    async fn whoami(&self) -> PlatformResult<AccountId> {
        if self.account_known.load(Ordering::SeqCst) {
            Ok(AccountId(777))
        } else {
            Err(PlatformError::HttpStatus(503, "session not started".into()))
        }
    }

    async fn warm_up(&self, _group_id: GroupId) -> PlatformResult<()> {
        self.warm_ups.fetch_add(1, Ordering::SeqCst);
        if self.fail_warm_up.load(Ordering::SeqCst) {
            return Err(PlatformError::HttpStatus(400, "PEER_ID_INVALID".into()));
        }
        Ok(())
    }

    async fn is_member(&self, _group_id: GroupId, _account: AccountId) -> PlatformResult<bool> {
        self.membership_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_membership_lookup.load(Ordering::SeqCst) {
            return Err(PlatformError::HttpStatus(500, "lookup failed".into()));
        }
        Ok(self.member.load(Ordering::SeqCst))
    }
}
