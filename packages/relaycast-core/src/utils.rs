//! General utilities shared across the application.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::protocol_constants::{DIAGNOSTIC_MAX_CHARS, NO_DISPLAY_NAME};

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Collapses runs of whitespace into single spaces and trims both ends.
#[must_use]
pub fn normalize_query(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns `true` if `text` is a direct content locator.
///
/// Only `http://` and `https://` count; anything else is treated as search terms.
#[must_use]
pub fn is_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// Truncates an error diagnostic so it is safe to show to an end user.
///
/// Keeps at most [`DIAGNOSTIC_MAX_CHARS`] characters and never splits a
/// multi-byte character.
#[must_use]
pub fn truncate_diagnostic(message: &str) -> String {
    truncate_chars(message.trim(), DIAGNOSTIC_MAX_CHARS)
}

/// Truncates `text` to at most `max_chars` characters.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Builds a display name from an artifact path.
///
/// Uses the file name with angle brackets stripped so it can be embedded in
/// markup-formatted chat messages. Returns `—` when there is nothing to show.
#[must_use]
pub fn display_name_for_path(path: &Path) -> String {
    let name: String = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .collect();

    if name.is_empty() {
        NO_DISPLAY_NAME.to_string()
    } else {
        name
    }
}

/// Normalizes an account handle so it always carries a leading `@`.
#[must_use]
pub fn normalize_handle(handle: &str) -> String {
    let handle = handle.trim();
    if handle.starts_with('@') {
        handle.to_string()
    } else {
        format!("@{handle}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalize_query_collapses_whitespace() {
        assert_eq!(normalize_query("  lofi \t hip\n\nhop  "), "lofi hip hop");
        assert_eq!(normalize_query("   "), "");
    }

    #[test]
    fn is_url_requires_http_scheme() {
        assert!(is_url("https://example.com/watch?v=1"));
        assert!(is_url("http://example.com/a.mp3"));
        assert!(!is_url("ftp://example.com/a.mp3"));
        assert!(!is_url("example.com/a.mp3"));
        assert!(!is_url("never gonna give you up"));
    }

    #[test]
    fn truncate_diagnostic_limits_length() {
        let long = "x".repeat(500);
        assert_eq!(truncate_diagnostic(&long).chars().count(), DIAGNOSTIC_MAX_CHARS);
        assert_eq!(truncate_diagnostic("  short  "), "short");
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("ဂီတဂီတ", 2), "ဂီ");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn display_name_strips_angle_brackets() {
        let path = PathBuf::from("/tmp/relaycast/<b>Song</b>_abc.mp3");
        assert_eq!(display_name_for_path(&path), "bSong_abc.mp3");
    }

    #[test]
    fn display_name_falls_back_for_empty_path() {
        assert_eq!(display_name_for_path(Path::new("")), NO_DISPLAY_NAME);
    }

    #[test]
    fn normalize_handle_adds_at_sign() {
        assert_eq!(normalize_handle("BikaAssistant"), "@BikaAssistant");
        assert_eq!(normalize_handle("@BikaAssistant"), "@BikaAssistant");
    }
}
