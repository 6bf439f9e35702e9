//! Voice-call platform access.
//!
//! # Module Structure
//!
//! - `types` - Group/account identifiers and chat kinds
//! - `traits` - Trait abstractions for testability
//! - `error` - Platform error types
//! - `gateway` - `CallGatewayClient` concrete trait implementation

pub mod error;
pub mod gateway;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::{PlatformError, PlatformResult};
pub use gateway::CallGatewayClient;
pub use traits::{CallPlatform, GroupDirectory, VoiceCallClient};
pub use types::{AccountId, ChatKind, GroupId};
