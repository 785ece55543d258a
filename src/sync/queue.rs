use std::collections::VecDeque;

/// Pending page navigations in arrival order.
///
/// The head is the entry currently being resolved against the viewer; it
/// only leaves the queue through [`pop_head`](Self::pop_head), so appends
/// never disturb it.
#[derive(Debug, Default, Clone)]
pub struct NavigationQueue {
    pages: VecDeque<u32>,
}

impl NavigationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `page`; returns `false` when it repeats the current tail.
    pub fn push(&mut self, page: u32) -> bool {
        if self.pages.back() == Some(&page) {
            return false;
        }
        self.pages.push_back(page);
        true
    }

    pub fn head(&self) -> Option<u32> {
        self.pages.front().copied()
    }

    pub fn pop_head(&mut self) -> Option<u32> {
        self.pages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.pages.iter().copied()
    }
}
