//! Domain types for the voice-call platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a multi-party chat with an associated voice channel.
///
/// Chat platforms use signed 64-bit ids (supergroups are negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for GroupId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifier of the driving account that joins calls and streams audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of chat a request originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// One-to-one conversation with the bot.
    #[default]
    Private,
    /// Basic group.
    Group,
    /// Large group with a persistent voice channel.
    Supergroup,
    /// Broadcast channel.
    Channel,
}

impl ChatKind {
    /// Returns `true` for multi-party contexts that can host a group call.
    #[must_use]
    pub fn is_multi_party_group(self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }
}
