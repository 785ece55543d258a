//! Serialized page navigation with bounded retries.
//!
//! [`SyncEngine`] owns the navigation queue, the retry timer and the viewer
//! adapter. Decisions are made by the pure [`transitions::transition`]
//! function; the engine only executes the resulting actions against the
//! viewer and feeds layout answers back in as events.

mod queue;
mod state;
mod transitions;

pub use queue::NavigationQueue;
pub use state::{RetryPolicy, SyncLifecycle, SyncState};
pub use transitions::{SyncAction, SyncEvent, transition};

use crate::viewer::{DocumentViewer, ViewerAdapter};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RetryTimer {
    page: u32,
    deadline: Instant,
    generation: u64,
}

pub struct SyncEngine<V> {
    state: SyncState,
    policy: RetryPolicy,
    viewer: ViewerAdapter<V>,
    retry_timer: Option<RetryTimer>,
    smooth_scroll: bool,
}

impl<V: DocumentViewer> SyncEngine<V> {
    pub fn new(viewer: ViewerAdapter<V>, policy: RetryPolicy, smooth_scroll: bool) -> Self {
        Self {
            state: SyncState::new(),
            policy,
            viewer,
            retry_timer: None,
            smooth_scroll,
        }
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn viewer(&self) -> &ViewerAdapter<V> {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut ViewerAdapter<V> {
        &mut self.viewer
    }

    pub fn enqueue(&mut self, page: u32, now: Instant) {
        self.dispatch(SyncEvent::Enqueue { page }, now);
    }

    /// The viewer reported that initialization completed. Ignored while
    /// no initialized handle is attached.
    pub fn viewer_ready(&mut self, now: Instant) {
        if !self.viewer.is_ready() {
            debug!("Readiness reported without an initialized viewer; ignoring");
            return;
        }
        self.dispatch(SyncEvent::ViewerReady, now);
    }

    pub fn page_rendered(&mut self, page: u32, now: Instant) {
        self.dispatch(SyncEvent::PageRendered { page }, now);
    }

    /// Drop all queued work and wait for the viewer to become ready again.
    pub fn reset(&mut self, now: Instant) {
        self.dispatch(SyncEvent::ViewerReloaded, now);
    }

    /// Fire the retry timer if its deadline has passed.
    pub fn poll_timers(&mut self, now: Instant) {
        let Some(timer) = self.retry_timer else {
            return;
        };
        if now < timer.deadline {
            return;
        }
        self.retry_timer = None;
        self.dispatch(
            SyncEvent::RetryElapsed {
                generation: timer.generation,
            },
            now,
        );
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.retry_timer.map(|timer| timer.deadline)
    }

    fn dispatch(&mut self, event: SyncEvent, now: Instant) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            trace!(?event, "Sync event");
            for action in transition(&mut self.state, &self.policy, event) {
                if let Some(follow_up) = self.run_action(action, now) {
                    pending.push_back(follow_up);
                }
            }
        }
    }

    fn run_action(&mut self, action: SyncAction, now: Instant) -> Option<SyncEvent> {
        match action {
            SyncAction::SetPage { page } => {
                self.viewer.set_page(page);
                None
            }
            SyncAction::ResolveLayout { page } => Some(match self.viewer.resolve_page_layout(page) {
                Some(layout) => SyncEvent::LayoutResolved {
                    page,
                    layout,
                    container_height: self.viewer.container_height(),
                },
                None => SyncEvent::LayoutUnavailable { page },
            }),
            SyncAction::ScrollTo { offset, .. } => {
                self.viewer.scroll_to(offset, self.smooth_scroll);
                None
            }
            SyncAction::ScheduleRetry {
                page,
                delay,
                generation,
                ..
            } => {
                self.retry_timer = Some(RetryTimer {
                    page,
                    deadline: now + delay,
                    generation,
                });
                None
            }
            SyncAction::CancelRetry => {
                if let Some(timer) = self.retry_timer.take() {
                    trace!(page = timer.page, "Cancelled retry timer");
                }
                None
            }
        }
    }
}
