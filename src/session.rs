//! One synchronized listening session.
//!
//! The session owns the playback source, the position tracker and the
//! navigation engine, and routes the three external event sources (playback
//! clock, viewer lifecycle, cross-context messages) into them. Everything
//! runs on the caller's thread; `handle` never fails.

use crate::command::{InboundMessage, LegacyCommand, OriginPolicy, ParsedCommand};
use crate::config::AppConfig;
use crate::playback::{PlaybackEvent, PlaybackSource};
use crate::progress::{self, Marker};
use crate::sync::{RetryPolicy, SyncEngine};
use crate::timeline::Timeline;
use crate::tracker::PositionTracker;
use crate::viewer::{DocumentViewer, ViewerAdapter};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};
use ts_rs::TS;

pub const PLAYBACK_BLOCKED_NOTICE: &str =
    "Audio could not start automatically. Press play to begin listening.";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Periodic wake-up: poll the playback source and due retry timers.
    Tick,
    Playback(PlaybackEvent),
    ViewerInitialized,
    PageRendered {
        page: u32,
    },
    ViewerReloaded,
    Inbound(InboundMessage),
    Play,
    Pause,
    TogglePlayPause,
    /// Pause and rewind to the start.
    Stop,
    SeekFraction(f64),
    SetRate(f32),
    SetVolume(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SessionStatus {
    pub playing: bool,
    pub time_display: String,
    pub progress_pct: Option<f64>,
    pub current_page: Option<u32>,
    /// 1-based item currently being heard.
    pub current_item: Option<u32>,
    pub queued_navigations: u32,
}

pub struct Session<P, V> {
    playback: P,
    engine: SyncEngine<V>,
    tracker: PositionTracker,
    timeline: Timeline,
    origins: OriginPolicy,
    item_label: String,
    playing: bool,
    duration: Option<f64>,
    blocked_notice_shown: bool,
    notices: Vec<String>,
}

impl<P: PlaybackSource, V: DocumentViewer> Session<P, V> {
    pub fn new(
        playback: P,
        viewer: ViewerAdapter<V>,
        timeline: Timeline,
        config: &AppConfig,
    ) -> Self {
        let engine = SyncEngine::new(viewer, RetryPolicy::from(config), config.smooth_scroll);
        let duration = playback.duration();
        Self {
            playback,
            engine,
            tracker: PositionTracker::new(),
            timeline,
            origins: OriginPolicy::new(config.allowed_origins.iter().cloned()),
            item_label: config.item_label.clone(),
            playing: false,
            duration,
            blocked_notice_shown: false,
            notices: Vec::new(),
        }
    }

    pub fn handle(&mut self, event: SessionEvent, now: Instant) {
        match event {
            SessionEvent::Tick => self.handle_tick(now),
            SessionEvent::Playback(event) => self.handle_playback_event(event, now),
            SessionEvent::ViewerInitialized => self.engine.viewer_ready(now),
            SessionEvent::PageRendered { page } => self.engine.page_rendered(page, now),
            SessionEvent::ViewerReloaded => {
                // The fresh viewer shows nothing yet; the next clock update
                // must navigate to the current page again.
                self.tracker.reset();
                self.engine.reset(now);
            }
            SessionEvent::Inbound(message) => self.handle_inbound(message, now),
            SessionEvent::Play => self.start_playback(),
            SessionEvent::Pause => self.pause_playback(),
            SessionEvent::TogglePlayPause => {
                if self.playing {
                    self.pause_playback();
                } else {
                    self.start_playback();
                }
            }
            SessionEvent::Stop => self.handle_stop(),
            SessionEvent::SeekFraction(fraction) => self.handle_seek(fraction, now),
            SessionEvent::SetRate(rate) => {
                debug!(rate, "Playback rate changed");
                self.playback.set_rate(rate);
            }
            SessionEvent::SetVolume(volume) => {
                debug!(volume, "Volume changed");
                self.playback.set_volume(volume);
            }
        }
    }

    fn handle_tick(&mut self, now: Instant) {
        for event in self.playback.poll_events() {
            self.handle_playback_event(event, now);
        }
        self.engine.poll_timers(now);
    }

    fn handle_playback_event(&mut self, event: PlaybackEvent, now: Instant) {
        match event {
            PlaybackEvent::MetadataLoaded { duration } => {
                info!(
                    duration = %progress::format_time(duration),
                    "Audio metadata loaded"
                );
                self.duration = Some(duration);
            }
            PlaybackEvent::TimeAdvanced { time } => self.sync_position(time, now),
            PlaybackEvent::Ended => {
                info!("Playback ended; rewinding page tracking");
                self.playing = false;
                self.tracker.reset();
            }
        }
    }

    fn sync_position(&mut self, time: f64, now: Instant) {
        if let Some(page) = self.tracker.observe(time, &self.timeline) {
            self.engine.enqueue(page, now);
        }
    }

    fn handle_inbound(&mut self, message: InboundMessage, now: Instant) {
        let Some(command) = self.origins.accept(&message) else {
            return;
        };
        match command {
            ParsedCommand::GotoPage { page_number } => {
                if page_number == 0 || page_number > self.timeline.total_pages() {
                    warn!(
                        page_number,
                        total_pages = self.timeline.total_pages(),
                        "Ignoring page request outside the document"
                    );
                    return;
                }
                info!(page_number, origin = %message.origin, "Page requested by another context");
                self.engine.enqueue(page_number, now);
            }
            ParsedCommand::Legacy(LegacyCommand::StartAudio) => {
                if self.playback.is_playing() {
                    debug!("start-audio received while already playing");
                } else {
                    info!("start-audio received; starting playback");
                    self.start_playback();
                }
            }
            ParsedCommand::Unrecognized(reason) => {
                warn!(origin = %message.origin, "Ignoring unrecognized message: {reason}");
            }
        }
    }

    fn start_playback(&mut self) {
        match self.playback.play() {
            Ok(()) => self.playing = true,
            Err(err) => {
                warn!("Playback start rejected: {err:#}");
                self.playing = false;
                if !self.blocked_notice_shown {
                    self.blocked_notice_shown = true;
                    self.notices.push(PLAYBACK_BLOCKED_NOTICE.to_string());
                }
            }
        }
    }

    fn pause_playback(&mut self) {
        self.playback.pause();
        self.playing = false;
    }

    fn handle_stop(&mut self) {
        self.pause_playback();
        if let Err(err) = self.playback.seek(0.0) {
            warn!("Rewind on stop failed: {err:#}");
        }
        self.tracker.reset();
    }

    fn handle_seek(&mut self, fraction: f64, now: Instant) {
        let Some(target) = progress::seek_target(fraction, self.duration) else {
            debug!(fraction, "Seek ignored; duration unknown");
            return;
        };
        match self.playback.seek(target) {
            Ok(()) => self.sync_position(self.playback.current_time(), now),
            Err(err) => warn!(seek_to = target, "Seek failed: {err:#}"),
        }
    }

    pub fn status(&self) -> SessionStatus {
        let time = self.playback.current_time();
        SessionStatus {
            playing: self.playing,
            time_display: progress::time_display(time, self.duration),
            progress_pct: progress::progress_percent(time, self.duration),
            current_page: self.tracker.current_page(),
            current_item: self
                .timeline
                .item_index_at(time)
                .map(|idx| u32::try_from(idx + 1).unwrap_or(u32::MAX)),
            queued_navigations: u32::try_from(self.engine.state().queue().len())
                .unwrap_or(u32::MAX),
        }
    }

    pub fn markers(&self) -> Vec<Marker> {
        progress::markers(&self.timeline, self.duration, &self.item_label)
    }

    /// User-visible notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn current_page(&self) -> Option<u32> {
        self.tracker.current_page()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut P {
        &mut self.playback
    }

    pub fn engine(&self) -> &SyncEngine<V> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SyncEngine<V> {
        &mut self.engine
    }
}
