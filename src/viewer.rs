//! Adapter over the external paginated document viewer.
//!
//! The viewer renders pages asynchronously and may be absent entirely while
//! it is (re)loading. Every adapter operation therefore tolerates a missing
//! handle and unrendered pages, degrading to a no-op or a `None` result.

use tracing::{debug, trace};

/// Rendered geometry of one page inside the viewer's scroll container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Distance from the top of the scroll content to the top of the page.
    pub top: f64,
    /// Rendered height of the page.
    pub height: f64,
}

/// Contract implemented by concrete document viewers.
pub trait DocumentViewer {
    /// Whether the viewer finished its own initialization.
    fn is_initialized(&self) -> bool;
    /// Coarse page switch, independent of smooth scrolling.
    fn set_current_page(&mut self, page: u32);
    /// Layout of `page` if it has been rendered.
    fn page_layout(&self, page: u32) -> Option<PageLayout>;
    /// Visible height of the scroll container.
    fn container_height(&self) -> f64;
    fn scroll_to(&mut self, offset: f64, smooth: bool);
}

pub struct ViewerAdapter<V> {
    handle: Option<V>,
}

impl<V> Default for ViewerAdapter<V> {
    fn default() -> Self {
        Self { handle: None }
    }
}

impl<V: DocumentViewer> ViewerAdapter<V> {
    pub fn new(handle: Option<V>) -> Self {
        Self { handle }
    }

    pub fn attach(&mut self, handle: V) {
        debug!("Viewer handle attached");
        self.handle = Some(handle);
    }

    pub fn detach(&mut self) -> Option<V> {
        debug!("Viewer handle detached");
        self.handle.take()
    }

    pub fn handle(&self) -> Option<&V> {
        self.handle.as_ref()
    }

    pub fn handle_mut(&mut self) -> Option<&mut V> {
        self.handle.as_mut()
    }

    pub fn is_ready(&self) -> bool {
        self.handle
            .as_ref()
            .map(|viewer| viewer.is_initialized())
            .unwrap_or(false)
    }

    pub fn set_page(&mut self, page: u32) {
        match self.handle.as_mut() {
            Some(viewer) => viewer.set_current_page(page),
            None => trace!(page, "No viewer handle; skipping page set"),
        }
    }

    /// Layout for `page`, or `None` while the page is not renderable.
    pub fn resolve_page_layout(&self, page: u32) -> Option<PageLayout> {
        let layout = self.handle.as_ref()?.page_layout(page)?;
        let usable = layout.top.is_finite() && layout.height.is_finite() && layout.height > 0.0;
        usable.then_some(layout)
    }

    pub fn container_height(&self) -> f64 {
        self.handle
            .as_ref()
            .map(|viewer| viewer.container_height())
            .filter(|height| height.is_finite() && *height > 0.0)
            .unwrap_or(0.0)
    }

    pub fn scroll_to(&mut self, offset: f64, smooth: bool) {
        let offset = sanitize_offset(offset);
        match self.handle.as_mut() {
            Some(viewer) => viewer.scroll_to(offset, smooth),
            None => trace!(offset, "No viewer handle; skipping scroll"),
        }
    }
}

/// Container offset that vertically centers the page.
pub fn centered_offset(layout: PageLayout, container_height: f64) -> f64 {
    sanitize_offset(layout.top - container_height / 2.0 + layout.height / 2.0)
}

fn sanitize_offset(offset: f64) -> f64 {
    if offset.is_finite() { offset.max(0.0) } else { 0.0 }
}
