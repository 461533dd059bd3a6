//! WidgetState: the single record the controller mutates, and the
//! immutable snapshots it publishes to the presentation layer.

use std::sync::Arc;

use tokio::time::Instant;

use crate::model::{ContactData, FeedData};
use crate::rotation::{LinkSlot, RotationEngine};
use crate::theme::ThemeController;
use crate::ticker::{TickerEngine, TickerPass};

/// Per-source load state.  Errors are collapsed into `Unavailable`; the
/// specific cause is only logged.
#[derive(Debug)]
pub enum LoadState<T> {
    Loading,
    Ready(Arc<T>),
    Unavailable,
}

impl<T> LoadState<T> {
    pub fn data(&self) -> Option<&Arc<T>> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// Everything one widget instance knows.  Owned by the controller alone.
#[derive(Debug)]
pub struct WidgetState {
    pub contact: LoadState<ContactData>,
    /// `None` when the load strategy has no feed (no ticker shown at all).
    pub feed: Option<LoadState<FeedData>>,
    pub retry_count: u32,
    pub rotation: RotationEngine,
    pub ticker: TickerEngine,
    pub theme: ThemeController,
}

impl WidgetState {
    pub fn new(with_feed: bool) -> Self {
        Self {
            contact: LoadState::Loading,
            feed: with_feed.then_some(LoadState::Loading),
            retry_count: 0,
            rotation: RotationEngine::new(),
            ticker: TickerEngine::new(),
            theme: ThemeController::new(),
        }
    }

    pub fn contact_data(&self) -> Option<&Arc<ContactData>> {
        self.contact.data()
    }

    pub fn feed_data(&self) -> Option<&Arc<FeedData>> {
        self.feed.as_ref().and_then(LoadState::data)
    }

    pub fn snapshot(&self) -> FooterSnapshot {
        let contact = match &self.contact {
            LoadState::Loading => RegionView::Loading,
            LoadState::Unavailable => RegionView::Unavailable,
            LoadState::Ready(_) => RegionView::Ready(ContactView {
                slots: self.rotation.slots().to_vec(),
                current_index: self.rotation.current_index(),
                link_count: self.rotation.links().len(),
            }),
        };

        let ticker = self.feed.as_ref().map(|feed| match feed {
            LoadState::Loading => RegionView::Loading,
            LoadState::Unavailable => RegionView::Unavailable,
            LoadState::Ready(_) => match (self.ticker.pass(), self.ticker.started_at()) {
                (Some(pass), Some(started_at)) => RegionView::Ready(TickerView {
                    pass: Arc::clone(pass),
                    generation: self.ticker.generation(),
                    started_at,
                    completed_passes: self.ticker.completed_passes(),
                }),
                _ => RegionView::Loading,
            },
        });

        FooterSnapshot {
            theme: self.theme.current().map(str::to_string),
            render_epoch: self.theme.epoch(),
            contact,
            ticker,
            retry_count: self.retry_count,
        }
    }
}

/// What a region of the footer should show.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionView<T> {
    Loading,
    Ready(T),
    Unavailable,
}

impl<T> RegionView<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactView {
    pub slots: Vec<LinkSlot>,
    pub current_index: usize,
    pub link_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerView {
    pub pass: Arc<TickerPass>,
    pub generation: u64,
    pub started_at: Instant,
    pub completed_passes: u64,
}

impl TickerView {
    pub fn progress(&self, now: Instant) -> f64 {
        crate::ticker::progress_at(self.pass.duration, self.started_at, now)
    }
}

/// Immutable view of a widget, published after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct FooterSnapshot {
    pub theme: Option<String>,
    /// Bumped on every structural re-render (theme change).
    pub render_epoch: u64,
    pub contact: RegionView<ContactView>,
    pub ticker: Option<RegionView<TickerView>>,
    pub retry_count: u32,
}

impl FooterSnapshot {
    pub fn loading(with_feed: bool) -> Self {
        WidgetState::new(with_feed).snapshot()
    }
}
