use crate::timeline::Timeline;
use tracing::debug;

/// Follows the playback clock and reports when the target page changes.
#[derive(Debug, Default, Clone)]
pub struct PositionTracker {
    current_page: Option<u32>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last page the tracker decided was active; `None` until the first tick
    /// and after [`reset`](Self::reset).
    pub fn current_page(&self) -> Option<u32> {
        self.current_page
    }

    /// Map `time` to a page, returning it only when it differs from the
    /// current page.
    pub fn observe(&mut self, time: f64, timeline: &Timeline) -> Option<u32> {
        let target = timeline.page_at(time);
        if self.current_page == Some(target) {
            return None;
        }
        debug!(
            time,
            from = ?self.current_page,
            to = target,
            "Target page changed"
        );
        self.current_page = Some(target);
        Some(target)
    }

    pub fn reset(&mut self) {
        self.current_page = None;
    }
}
