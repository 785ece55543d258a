//! JSON-lines bridge between the headless player and its host.
//!
//! The host (the page embedding the document viewer) writes one
//! [`BridgeInput`] object per line describing viewer lifecycle, transport
//! controls and relayed cross-context messages. The player answers with
//! [`BridgeOutput`] lines: navigation commands for the viewer plus status
//! updates for the transport bar.

use crate::command::InboundMessage;
use crate::playback::PlaybackSource;
use crate::progress::Marker;
use crate::session::{Session, SessionEvent, SessionStatus};
use crate::viewer::{DocumentViewer, PageLayout};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[serde(tag = "event", rename_all = "camelCase")]
#[ts(export)]
pub enum BridgeInput {
    Initialized,
    PageRendered { page: u32, top: f64, height: f64 },
    ContainerResized { height: f64 },
    Reload,
    Message { origin: String, data: String },
    Play,
    Pause,
    Toggle,
    Stop,
    Seek { fraction: f64 },
    Speed { rate: f32 },
    Volume { level: f32 },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export)]
pub enum BridgeOutput {
    GotoPage {
        #[serde(rename = "pageNumber")]
        page_number: u32,
    },
    ScrollTo {
        offset: f64,
        smooth: bool,
    },
    Notice {
        message: String,
    },
    Status {
        status: SessionStatus,
    },
    Markers {
        markers: Vec<Marker>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Viewer mirror fed by host reports; commands go to an outbox.
#[derive(Debug, Default)]
pub struct BridgeViewer {
    initialized: bool,
    container_height: f64,
    layouts: HashMap<u32, PageLayout>,
    outbox: Vec<BridgeOutput>,
}

impl BridgeViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub fn record_page(&mut self, page: u32, layout: PageLayout) {
        self.layouts.insert(page, layout);
    }

    /// Drop everything tied to the previous document load. The container
    /// keeps its size across a reload.
    pub fn forget_pages(&mut self) {
        self.initialized = false;
        self.layouts.clear();
        self.outbox.clear();
    }

    pub fn set_container_height(&mut self, height: f64) {
        self.container_height = height;
    }

    pub fn take_outbox(&mut self) -> Vec<BridgeOutput> {
        std::mem::take(&mut self.outbox)
    }
}

impl DocumentViewer for BridgeViewer {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn set_current_page(&mut self, page: u32) {
        self.outbox.push(BridgeOutput::GotoPage { page_number: page });
    }

    fn page_layout(&self, page: u32) -> Option<PageLayout> {
        self.layouts.get(&page).copied()
    }

    fn container_height(&self) -> f64 {
        self.container_height
    }

    fn scroll_to(&mut self, offset: f64, smooth: bool) {
        self.outbox.push(BridgeOutput::ScrollTo { offset, smooth });
    }
}

pub fn parse_bridge_line(line: &str) -> Option<BridgeInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(input) => Some(input),
        Err(err) => {
            warn!(line, "Ignoring malformed bridge input: {err}");
            None
        }
    }
}

/// Route one host report into the session.
pub fn apply_input<P: PlaybackSource>(
    session: &mut Session<P, BridgeViewer>,
    input: BridgeInput,
    now: Instant,
) -> Control {
    debug!(?input, "Bridge input");
    let event = match input {
        BridgeInput::Initialized => {
            with_viewer(session, BridgeViewer::mark_initialized);
            SessionEvent::ViewerInitialized
        }
        BridgeInput::PageRendered { page, top, height } => {
            with_viewer(session, |viewer| {
                viewer.record_page(page, PageLayout { top, height })
            });
            SessionEvent::PageRendered { page }
        }
        BridgeInput::ContainerResized { height } => {
            with_viewer(session, |viewer| viewer.set_container_height(height));
            return Control::Continue;
        }
        BridgeInput::Reload => {
            with_viewer(session, BridgeViewer::forget_pages);
            SessionEvent::ViewerReloaded
        }
        BridgeInput::Message { origin, data } => {
            SessionEvent::Inbound(InboundMessage { origin, data })
        }
        BridgeInput::Play => SessionEvent::Play,
        BridgeInput::Pause => SessionEvent::Pause,
        BridgeInput::Toggle => SessionEvent::TogglePlayPause,
        BridgeInput::Stop => SessionEvent::Stop,
        BridgeInput::Seek { fraction } => SessionEvent::SeekFraction(fraction),
        BridgeInput::Speed { rate } => SessionEvent::SetRate(rate),
        BridgeInput::Volume { level } => SessionEvent::SetVolume(level),
        BridgeInput::Quit => return Control::Quit,
    };
    session.handle(event, now);
    Control::Continue
}

fn with_viewer<P: PlaybackSource>(
    session: &mut Session<P, BridgeViewer>,
    f: impl FnOnce(&mut BridgeViewer),
) {
    let adapter = session.engine_mut().viewer_mut();
    if adapter.handle().is_none() {
        adapter.attach(BridgeViewer::new());
    }
    if let Some(viewer) = adapter.handle_mut() {
        f(viewer);
    }
}

/// Collects pending output lines, suppressing unchanged status and markers.
#[derive(Debug, Default)]
pub struct OutputCollector {
    last_status: Option<SessionStatus>,
    markers_for: Option<Option<u64>>,
}

impl OutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect<P: PlaybackSource>(
        &mut self,
        session: &mut Session<P, BridgeViewer>,
    ) -> Vec<BridgeOutput> {
        let mut outputs = session
            .engine_mut()
            .viewer_mut()
            .handle_mut()
            .map(BridgeViewer::take_outbox)
            .unwrap_or_default();

        outputs.extend(
            session
                .take_notices()
                .into_iter()
                .map(|message| BridgeOutput::Notice { message }),
        );

        let duration_key = session.duration().map(f64::to_bits);
        if self.markers_for != Some(duration_key) {
            self.markers_for = Some(duration_key);
            outputs.push(BridgeOutput::Markers {
                markers: session.markers(),
            });
        }

        let status = session.status();
        if self.last_status.as_ref() != Some(&status) {
            self.last_status = Some(status.clone());
            outputs.push(BridgeOutput::Status { status });
        }
        outputs
    }
}
