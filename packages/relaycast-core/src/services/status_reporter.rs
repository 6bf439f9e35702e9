//! Human-facing projections of group state.
//!
//! Everything here is read-only: the reporter turns a queue snapshot plus a
//! presence result into text, and carries the static setup/help guides.

use std::fmt::Write as _;

use serde::Serialize;

use crate::platform::GroupId;
use crate::protocol_constants::{APP_NAME, NO_DISPLAY_NAME};
use crate::services::{CallState, QueueSnapshot};
use crate::utils::normalize_handle;

/// How users reach the driving account to invite it into a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantContact {
    /// Account handle, always starting with `@`.
    pub handle: String,
    /// Public link to the account.
    pub link: String,
}

impl AssistantContact {
    /// Builds a contact from a raw handle and a link base such as `https://t.me/`.
    pub fn new(handle: &str, link_base: &str) -> Self {
        let handle = normalize_handle(handle);
        let base = link_base.trim_end_matches('/');
        let link = format!("{}/{}", base, handle.trim_start_matches('@'));
        Self { handle, link }
    }

    /// One-line invitation hint.
    #[must_use]
    pub fn invite_hint(&self) -> String {
        format!(
            "Add/invite {} ({}) to the group, start the voice chat, then play again.",
            self.handle, self.link
        )
    }
}

/// Point-in-time status of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub group_id: GroupId,
    pub assistant_present: bool,
    /// Tracks held, current included.
    pub queue_length: usize,
    pub now_playing: Option<String>,
    pub pending: Vec<String>,
    pub call_state: CallState,
    /// Present only when the assistant is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_hint: Option<String>,
}

impl StatusReport {
    /// Short multi-line rendering.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("Status\n");
        let _ = writeln!(
            out,
            "• Assistant in group: {}",
            if self.assistant_present { "yes" } else { "no" }
        );
        let _ = writeln!(out, "• Queue length: {}", self.queue_length);
        let _ = write!(
            out,
            "• Now playing: {}",
            self.now_playing.as_deref().unwrap_or(NO_DISPLAY_NAME)
        );
        if let Some(hint) = &self.join_hint {
            let _ = write!(out, "\n\n{hint}");
        }
        out
    }
}

/// One numbered line of a queue listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// 1-based position, the current track being 1.
    pub position: usize,
    pub display_name: String,
    pub now_playing: bool,
}

/// Builds status reports, queue listings and guide texts.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    contact: AssistantContact,
    listing_limit: usize,
}

impl StatusReporter {
    pub fn new(contact: AssistantContact, listing_limit: usize) -> Self {
        Self {
            contact,
            listing_limit,
        }
    }

    #[must_use]
    pub fn contact(&self) -> &AssistantContact {
        &self.contact
    }

    pub fn report(
        &self,
        group_id: GroupId,
        assistant_present: bool,
        snapshot: &QueueSnapshot,
        call_state: CallState,
    ) -> StatusReport {
        StatusReport {
            group_id,
            assistant_present,
            queue_length: snapshot.len(),
            now_playing: snapshot.current.as_ref().map(|c| c.display_name.clone()),
            pending: snapshot
                .pending
                .iter()
                .map(|p| p.display_name.clone())
                .collect(),
            call_state,
            join_hint: (!assistant_present).then(|| self.contact.invite_hint()),
        }
    }

    /// The first `listing_limit` entries, current first.
    pub fn listing(&self, snapshot: &QueueSnapshot) -> Vec<QueueEntry> {
        let has_current = snapshot.current.is_some();
        snapshot
            .entries()
            .take(self.listing_limit)
            .enumerate()
            .map(|(i, entry)| QueueEntry {
                position: i + 1,
                display_name: entry.display_name.clone(),
                now_playing: has_current && i == 0,
            })
            .collect()
    }

    #[must_use]
    pub fn setup_text(&self) -> String {
        format!(
            "Setup (group voice chat)\n\n\
             1) Start the voice chat in the group\n\
             2) Add/invite the assistant account: {} ({})\n\
             3) Then use /play <song name or URL>\n\n\
             Note: the assistant cannot add itself to a group.",
            self.contact.handle, self.contact.link
        )
    }

    #[must_use]
    pub fn help_text(&self) -> String {
        format!(
            "{APP_NAME} - group voice chat music\n\n\
             Commands:\n\
             • /setup - setup guide\n\
             • /status - check the assistant and queue\n\
             • /play <name> - search and stream\n\
             • /play <URL> - stream a link\n\
             • /skip - next track\n\
             • /stop - stop and clear the queue\n\
             • /queue - list the queue\n\n\
             The voice chat must be started first.\n\
             Assistant: {} ({}) must be a member of the group.",
            self.contact.handle, self.contact.link
        )
    }
}

/// Renders a queue listing as text.
pub fn render_listing(entries: &[QueueEntry]) -> String {
    let mut out = format!("Queue (top {})", entries.len());
    for entry in entries {
        let marker = if entry.now_playing { "▶" } else { "•" };
        let _ = write!(out, "\n{} {}. {}", marker, entry.position, entry.display_name);
    }
    out
}
