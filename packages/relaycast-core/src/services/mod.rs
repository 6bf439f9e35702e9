//! Application services layer.
//!
//! This module contains the playback services that sit between the inbound
//! transport (api/) and infrastructure (platform/, resolver/).

pub mod call_session;
pub mod group_queue;
pub mod playback_controller;
pub mod presence_gate;
pub mod status_reporter;

pub use call_session::{CallError, CallResult, CallSession, CallState};
pub use group_queue::{GroupQueue, QueueSnapshot};
pub use playback_controller::{PlaybackController, PlaybackSettings};
pub use presence_gate::PresenceGate;
pub use status_reporter::{
    render_listing, AssistantContact, QueueEntry, StatusReport, StatusReporter,
};
