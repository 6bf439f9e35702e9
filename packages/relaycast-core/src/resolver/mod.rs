//! Artifact resolution: turning a request into a local audio file.
//!
//! Resolution is the one long-blocking step of a play request (network
//! download plus transcode). Implementations may take tens of seconds and
//! must be invoked off any per-group serialization path.

mod ytdlp;

pub use ytdlp::{YtDlpConfig, YtDlpResolver};

use async_trait::async_trait;
use thiserror::Error;

use crate::artifact::Artifact;
use crate::protocol_constants::SEARCH_FIRST_RESULT_PREFIX;
use crate::utils::{is_url, truncate_diagnostic};

/// Errors that can occur while resolving a request to an artifact.
///
/// Diagnostics are already truncated and safe to show to end users.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The search produced no result.
    #[error("No result found: {0}")]
    NotFound(String),

    /// Download or conversion failed (includes timeouts).
    #[error("Resolution failed: {0}")]
    Failed(String),
}

/// Convenient Result alias for resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

impl ResolveError {
    /// Builds a `NotFound` with a truncated diagnostic.
    pub fn not_found(diagnostic: impl AsRef<str>) -> Self {
        Self::NotFound(truncate_diagnostic(diagnostic.as_ref()))
    }

    /// Builds a `Failed` with a truncated diagnostic.
    pub fn failed(diagnostic: impl AsRef<str>) -> Self {
        Self::Failed(truncate_diagnostic(diagnostic.as_ref()))
    }

    /// The user-safe diagnostic text.
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        match self {
            Self::NotFound(d) | Self::Failed(d) => d,
        }
    }
}

/// What a request text points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveTarget {
    /// A direct content locator (`http`/`https` only).
    Url(String),
    /// Free-text search terms; the first result is used.
    Search(String),
}

impl ResolveTarget {
    /// Classifies request text. Only syntactic URLs are treated as locators.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        if is_url(query) {
            Self::Url(query.to_string())
        } else {
            Self::Search(query.to_string())
        }
    }

    /// The argument handed to the downloader.
    #[must_use]
    pub fn downloader_arg(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Search(terms) => format!("{SEARCH_FIRST_RESULT_PREFIX}{terms}"),
        }
    }
}

/// Trait for resolving a query or URL into a locally playable artifact.
///
/// On success the returned artifact's file is owned by the caller.
#[async_trait]
pub trait ArtifactResolver: Send + Sync {
    /// Resolves `query` (already normalized) to exactly one artifact.
    async fn resolve(&self, query: &str) -> ResolveResult<Artifact>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_direct_locators() {
        assert_eq!(
            ResolveTarget::parse("https://youtu.be/dQw4w9WgXcQ"),
            ResolveTarget::Url("https://youtu.be/dQw4w9WgXcQ".into())
        );
    }

    #[test]
    fn free_text_becomes_first_result_search() {
        let target = ResolveTarget::parse("www.example.com song");
        assert_eq!(target, ResolveTarget::Search("www.example.com song".into()));
        assert_eq!(target.downloader_arg(), "ytsearch1:www.example.com song");
    }

    #[test]
    fn diagnostics_are_truncated() {
        let err = ResolveError::failed("e".repeat(1000));
        assert_eq!(err.diagnostic().len(), 180);
        assert!(matches!(err, ResolveError::Failed(_)));
    }
}
