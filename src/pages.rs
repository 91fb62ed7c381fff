//! Active-page tracking and navigation notifications.

use crate::error::Result;
use crate::handoff::HandoffStore;
use crate::model::{ArtifactKind, PageId};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationEvent {
    pub from: PageId,
    pub to: PageId,
}

/// Owns which page is visible. Exactly one page is active at any time.
#[derive(Debug)]
pub struct PageController {
    active: PageId,
    subscribers: Vec<UnboundedSender<NavigationEvent>>,
}

impl Default for PageController {
    fn default() -> Self {
        Self::new(PageId::Home)
    }
}

impl PageController {
    pub fn new(initial: PageId) -> Self {
        Self {
            active: initial,
            subscribers: Vec::new(),
        }
    }

    pub fn active(&self) -> PageId {
        self.active
    }

    /// Receive a [`NavigationEvent`] for every successful navigation from now on.
    pub fn subscribe(&mut self) -> UnboundedReceiver<NavigationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Navigate by page identifier. Unknown identifiers leave the active page untouched.
    pub fn navigate(&mut self, page_id: &str) -> Result<PageId> {
        let target: PageId = page_id.parse()?;
        self.navigate_to(target);
        Ok(target)
    }

    pub fn navigate_to(&mut self, page: PageId) {
        let event = NavigationEvent {
            from: self.active,
            to: page,
        };
        self.active = page;
        debug!(from = %event.from, to = %event.to, "navigate");
        // Dropped receivers are pruned here.
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn next(&mut self) -> PageId {
        let idx = (self.active.index() + 1) % PageId::ALL.len();
        let page = PageId::ALL[idx];
        self.navigate_to(page);
        page
    }

    pub fn previous(&mut self) -> PageId {
        let len = PageId::ALL.len();
        let idx = (self.active.index() + len - 1) % len;
        let page = PageId::ALL[idx];
        self.navigate_to(page);
        page
    }
}

/// Source artifacts the destination pages picked up from the handoff store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageInputs {
    /// Image the Video page will animate; text-to-video when absent.
    pub video_source_image: Option<String>,
    /// Video the Editor page will edit.
    pub editor_source_video: Option<String>,
}

impl PageInputs {
    /// React to `page` becoming active by consuming the matching handoff slot.
    ///
    /// Returns the path that was picked up, if any. A page with nothing waiting keeps
    /// whatever source it already had.
    pub fn activate(&mut self, page: PageId, handoff: &HandoffStore) -> Option<String> {
        let (kind, slot) = match page {
            PageId::VideoGeneration => (ArtifactKind::Image, &mut self.video_source_image),
            PageId::VideoEditor => (ArtifactKind::Video, &mut self.editor_source_video),
            _ => return None,
        };
        let taken = handoff.take_and_clear(kind)?;
        *slot = Some(taken.clone());
        Some(taken)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
