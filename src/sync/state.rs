use super::queue::NavigationQueue;
use crate::config::AppConfig;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncLifecycle {
    Idle,
    /// The head entry is being resolved against the viewer right now.
    Attempting { page: u32, failures: u32 },
    /// The head entry failed and waits for its retry timer or a render
    /// notification.
    RetryPending {
        page: u32,
        failures: u32,
        generation: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// Attempts granted to one page before it is abandoned; at least one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

impl From<&AppConfig> for RetryPolicy {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.max_retries, config.retry_delay())
    }
}

/// Everything the navigation state machine mutates.
#[derive(Debug, Clone)]
pub struct SyncState {
    pub(super) queue: NavigationQueue,
    pub(super) lifecycle: SyncLifecycle,
    pub(super) viewer_ready: bool,
    pub(super) generation: u64,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self {
            queue: NavigationQueue::new(),
            lifecycle: SyncLifecycle::Idle,
            viewer_ready: false,
            generation: 0,
        }
    }

    pub fn queue(&self) -> &NavigationQueue {
        &self.queue
    }

    pub fn lifecycle(&self) -> SyncLifecycle {
        self.lifecycle
    }

    pub fn viewer_ready(&self) -> bool {
        self.viewer_ready
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.lifecycle, SyncLifecycle::Idle)
    }

    /// Page the engine is currently trying to reach, if any.
    pub fn in_flight(&self) -> Option<u32> {
        match self.lifecycle {
            SyncLifecycle::Idle => None,
            SyncLifecycle::Attempting { page, .. } | SyncLifecycle::RetryPending { page, .. } => {
                Some(page)
            }
        }
    }

    /// Invalidate every outstanding retry timer.
    pub(super) fn bump_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}
