//! Per-group play queue.
//!
//! Holds the ordered pending artifacts plus the one currently streaming.
//! `current` is never a member of `pending`: the head moves out of `pending`
//! only when it is dequeued for playback. Every path that drops an artifact
//! from the queue releases it.

use std::collections::VecDeque;

use serde::Serialize;

use crate::artifact::{Artifact, ArtifactSummary};

/// Ordered pending artifacts plus the currently-playing one.
///
/// Not synchronized; callers hold the group's lock while mutating it.
#[derive(Debug, Default)]
pub struct GroupQueue {
    pending: VecDeque<Artifact>,
    current: Option<Artifact>,
}

/// Read-only view of a queue for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub current: Option<ArtifactSummary>,
    pub pending: Vec<ArtifactSummary>,
}

impl QueueSnapshot {
    /// Number of tracks held (current plus pending).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current first, then pending in play order.
    pub fn entries(&self) -> impl Iterator<Item = &ArtifactSummary> {
        self.current.iter().chain(self.pending.iter())
    }
}

impl GroupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an artifact and returns the number of tracks now held
    /// (current plus pending), i.e. the new item's 1-based position.
    pub fn enqueue(&mut self, artifact: Artifact) -> usize {
        self.pending.push_back(artifact);
        self.len()
    }

    /// Next artifact to play, without removing it.
    #[must_use]
    pub fn peek_head(&self) -> Option<&Artifact> {
        self.pending.front()
    }

    /// Promotes the head of `pending` to `current`.
    ///
    /// A previous `current` is released. Returns `None` (and leaves
    /// `current` empty) when there is nothing left to play.
    pub fn advance(&mut self) -> Option<&Artifact> {
        self.remove_current();
        self.current = self.pending.pop_front();
        self.current.as_ref()
    }

    /// Releases and discards the current artifact, if any.
    pub fn remove_current(&mut self) {
        if let Some(artifact) = self.current.take() {
            artifact.release();
        }
    }

    /// Releases every held artifact and empties the queue.
    ///
    /// Returns the number of artifacts released.
    pub fn clear(&mut self) -> usize {
        let count = self.len();
        self.remove_current();
        for artifact in self.pending.drain(..) {
            artifact.release();
        }
        count
    }

    #[must_use]
    pub fn current(&self) -> Option<&Artifact> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of tracks held (current plus pending).
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    #[must_use]
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            current: self.current.as_ref().map(Artifact::summary),
            pending: self.pending.iter().map(Artifact::summary).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    fn artifact(dir: &Path, name: &str) -> (Artifact, PathBuf) {
        let path = dir.join(name);
        std::fs::write(&path, b"ID3").unwrap();
        (Artifact::new(&path), path)
    }

    #[test]
    fn enqueue_returns_new_length() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();
        assert_eq!(q.enqueue(artifact(dir.path(), "a.mp3").0), 1);
        assert_eq!(q.enqueue(artifact(dir.path(), "b.mp3").0), 2);
        assert_eq!(q.pending_len(), 2);
        assert!(q.current().is_none());
    }

    #[test]
    fn length_counts_current_and_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();
        q.enqueue(artifact(dir.path(), "a.mp3").0);
        q.advance();
        assert_eq!(q.enqueue(artifact(dir.path(), "b.mp3").0), 2);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn peek_does_not_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();
        assert!(q.peek_head().is_none());
        q.enqueue(artifact(dir.path(), "a.mp3").0);
        assert_eq!(q.peek_head().unwrap().display_name(), "a.mp3");
        assert_eq!(q.pending_len(), 1);
    }

    #[test]
    fn advance_promotes_head_and_releases_previous() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();
        let (a, a_path) = artifact(dir.path(), "a.mp3");
        let (b, b_path) = artifact(dir.path(), "b.mp3");
        q.enqueue(a);
        q.enqueue(b);

        assert_eq!(q.advance().unwrap().display_name(), "a.mp3");
        assert_eq!(q.pending_len(), 1);
        assert!(a_path.exists());

        assert_eq!(q.advance().unwrap().display_name(), "b.mp3");
        assert!(!a_path.exists());
        assert!(b_path.exists());
        assert_eq!(q.pending_len(), 0);
    }

    #[test]
    fn advance_on_empty_clears_current() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();
        let (a, a_path) = artifact(dir.path(), "a.mp3");
        q.enqueue(a);
        q.advance();

        assert!(q.advance().is_none());
        assert!(q.current().is_none());
        assert!(q.is_empty());
        assert!(!a_path.exists());
    }

    #[test]
    fn remove_current_keeps_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();
        let (a, a_path) = artifact(dir.path(), "a.mp3");
        q.enqueue(a);
        q.enqueue(artifact(dir.path(), "b.mp3").0);
        q.advance();

        q.remove_current();
        assert!(q.current().is_none());
        assert!(!a_path.exists());
        assert_eq!(q.peek_head().unwrap().display_name(), "b.mp3");
    }

    #[test]
    fn clear_releases_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();
        let (a, a_path) = artifact(dir.path(), "a.mp3");
        let (b, b_path) = artifact(dir.path(), "b.mp3");
        let (c, c_path) = artifact(dir.path(), "c.mp3");
        q.enqueue(a);
        q.enqueue(b);
        q.enqueue(c);
        q.advance();

        assert_eq!(q.clear(), 3);
        assert!(q.is_empty());
        assert!(!a_path.exists());
        assert!(!b_path.exists());
        assert!(!c_path.exists());

        // Clearing an empty queue is fine
        assert_eq!(q.clear(), 0);
    }

    #[test]
    fn snapshot_lists_current_then_pending() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();
        q.enqueue(artifact(dir.path(), "a.mp3").0);
        q.enqueue(artifact(dir.path(), "b.mp3").0);
        q.advance();

        let snap = q.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.current.as_ref().unwrap().display_name, "a.mp3");
        let names: Vec<_> = snap.entries().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, vec!["a.mp3", "b.mp3"]);
    }

    #[test]
    fn at_most_one_current_and_no_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = GroupQueue::new();

        // Interleave enqueues and advances; invariants must hold after each step
        for i in 0..12 {
            q.enqueue(artifact(dir.path(), &format!("t{i}.mp3")).0);
            if i % 3 == 0 {
                q.advance();
            }

            let snap = q.snapshot();
            let ids: Vec<_> = snap.entries().map(|e| e.id.clone()).collect();
            let unique: HashSet<_> = ids.iter().collect();
            assert_eq!(ids.len(), unique.len());
            assert_eq!(snap.len(), q.len());
        }
    }
}
