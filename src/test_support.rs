//! In-memory stand-ins for the viewer and playback contracts.

use crate::playback::{PlaybackEvent, PlaybackSource};
use crate::viewer::{DocumentViewer, PageLayout};
use anyhow::{Result, anyhow};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Default)]
pub(crate) struct FakeViewer {
    pub(crate) initialized: bool,
    pub(crate) container_height: f64,
    pub(crate) layouts: HashMap<u32, PageLayout>,
    pub(crate) page_sets: Vec<u32>,
    pub(crate) scrolls: Vec<(f64, bool)>,
    pub(crate) layout_queries: std::cell::RefCell<Vec<u32>>,
}

impl FakeViewer {
    pub(crate) fn initialized(container_height: f64) -> Self {
        Self {
            initialized: true,
            container_height,
            ..Self::default()
        }
    }

    pub(crate) fn render(&mut self, page: u32, top: f64, height: f64) {
        self.layouts.insert(page, PageLayout { top, height });
    }

    /// Renders every page in `pages` stacked at a uniform height.
    pub(crate) fn render_uniform(&mut self, pages: std::ops::RangeInclusive<u32>, height: f64) {
        for page in pages {
            self.render(page, f64::from(page - 1) * height, height);
        }
    }

    pub(crate) fn queries_for(&self, page: u32) -> usize {
        self.layout_queries
            .borrow()
            .iter()
            .filter(|queried| **queried == page)
            .count()
    }
}

impl DocumentViewer for FakeViewer {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn set_current_page(&mut self, page: u32) {
        self.page_sets.push(page);
    }

    fn page_layout(&self, page: u32) -> Option<PageLayout> {
        self.layout_queries.borrow_mut().push(page);
        self.layouts.get(&page).copied()
    }

    fn container_height(&self) -> f64 {
        self.container_height
    }

    fn scroll_to(&mut self, offset: f64, smooth: bool) {
        self.scrolls.push((offset, smooth));
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakePlayback {
    pub(crate) time: f64,
    pub(crate) duration: Option<f64>,
    pub(crate) playing: bool,
    pub(crate) reject_play: bool,
    pub(crate) play_calls: usize,
    pub(crate) seeks: Vec<f64>,
    pub(crate) rate: f32,
    pub(crate) volume: f32,
    pub(crate) events: VecDeque<PlaybackEvent>,
}

impl FakePlayback {
    pub(crate) fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            rate: 1.0,
            volume: 1.0,
            ..Self::default()
        }
    }
}

impl PlaybackSource for FakePlayback {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) -> Result<()> {
        self.play_calls += 1;
        if self.reject_play {
            return Err(anyhow!("playback start rejected by the environment"));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, time: f64) -> Result<()> {
        self.seeks.push(time);
        self.time = time;
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn poll_events(&mut self) -> Vec<PlaybackEvent> {
        self.events.drain(..).collect()
    }
}
