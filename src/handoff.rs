//! Single-slot mailboxes for passing an artifact path from one page to the next.
//!
//! A producer page `put`s the storage path of something it generated; the destination
//! page `take_and_clear`s it when it becomes active. Each slot is consumed at most once.

use crate::model::ArtifactKind;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Cheaply cloneable handle; clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct HandoffStore {
    slots: Arc<Mutex<HashMap<ArtifactKind, String>>>,
}

impl HandoffStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ArtifactKind, String>> {
        // A panic while holding the lock cannot leave a half-written map entry.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `path` for `kind`, returning whatever it replaced.
    pub fn put(&self, kind: ArtifactKind, path: impl Into<String>) -> Option<String> {
        let path = path.into();
        debug!(?kind, %path, "handoff put");
        self.lock().insert(kind, path)
    }

    /// Remove and return the entry for `kind`.
    pub fn take_and_clear(&self, kind: ArtifactKind) -> Option<String> {
        let taken = self.lock().remove(&kind);
        debug!(?kind, found = taken.is_some(), "handoff take");
        taken
    }

    pub fn peek(&self, kind: ArtifactKind) -> Option<String> {
        self.lock().get(&kind).cloned()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_returns_path_exactly_once() {
        let store = HandoffStore::new();
        store.put(ArtifactKind::Image, "images/fox123.png");

        assert_eq!(
            store.take_and_clear(ArtifactKind::Image).as_deref(),
            Some("images/fox123.png")
        );
        assert_eq!(store.take_and_clear(ArtifactKind::Image), None);
    }

    #[test]
    fn put_overwrites_same_kind_only() {
        let store = HandoffStore::new();
        assert_eq!(store.put(ArtifactKind::Video, "videos/a.mp4"), None);
        assert_eq!(
            store.put(ArtifactKind::Video, "videos/b.mp4").as_deref(),
            Some("videos/a.mp4")
        );
        store.put(ArtifactKind::Image, "images/x.png");

        assert_eq!(store.peek(ArtifactKind::Video).as_deref(), Some("videos/b.mp4"));
        assert_eq!(
            store.take_and_clear(ArtifactKind::Video).as_deref(),
            Some("videos/b.mp4")
        );
        assert_eq!(store.peek(ArtifactKind::Image).as_deref(), Some("images/x.png"));
    }

    #[test]
    fn clones_share_slots() {
        let producer = HandoffStore::new();
        let consumer = producer.clone();
        producer.put(ArtifactKind::Image, "images/shared.png");
        assert_eq!(
            consumer.take_and_clear(ArtifactKind::Image).as_deref(),
            Some("images/shared.png")
        );
        assert_eq!(producer.peek(ArtifactKind::Image), None);

        producer.put(ArtifactKind::Video, "videos/v.mp4");
        consumer.clear();
        assert_eq!(producer.peek(ArtifactKind::Video), None);
    }

    #[test]
    fn concurrent_takers_see_the_entry_once() {
        let store = HandoffStore::new();
        store.put(ArtifactKind::Video, "videos/race.mp4");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = store.clone();
                std::thread::spawn(move || s.take_and_clear(ArtifactKind::Video))
            })
            .collect();
        let hits = handles
            .into_iter()
            .filter_map(|h| h.join().ok().flatten())
            .count();
        assert_eq!(hits, 1);
    }
}
