//! Playback position source backed by `rodio`.
//!
//! rodio 0.18 does not report the sink position, so the clock is tracked
//! here: an anchor position plus the monotonic time elapsed since the anchor,
//! scaled by the playback rate.

use anyhow::{Context, Result, anyhow};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub const MIN_PLAYBACK_RATE: f32 = 0.25;
pub const MAX_PLAYBACK_RATE: f32 = 3.0;
pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    MetadataLoaded { duration: f64 },
    TimeAdvanced { time: f64 },
    Ended,
}

/// Contract of the audio clock driving page synchronization.
pub trait PlaybackSource {
    /// Current position in seconds.
    fn current_time(&self) -> f64;
    /// Total length in seconds, once known.
    fn duration(&self) -> Option<f64>;
    fn is_playing(&self) -> bool;
    /// Start or resume; fails when the environment refuses to start audio.
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn seek(&mut self, time: f64) -> Result<()>;
    fn set_rate(&mut self, rate: f32);
    fn set_volume(&mut self, volume: f32);
    /// Events produced since the previous poll.
    fn poll_events(&mut self) -> Vec<PlaybackEvent>;
}

/// Position estimate from an anchor and a monotonic instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    anchor_secs: f64,
    anchor_instant: Option<Instant>,
    rate: f64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            anchor_secs: 0.0,
            anchor_instant: None,
            rate: 1.0,
        }
    }
}

impl PlaybackClock {
    pub fn is_running(&self) -> bool {
        self.anchor_instant.is_some()
    }

    pub fn position(&self, now: Instant) -> f64 {
        match self.anchor_instant {
            Some(since) => {
                let elapsed = now.saturating_duration_since(since).as_secs_f64();
                self.anchor_secs + elapsed * self.rate
            }
            None => self.anchor_secs,
        }
    }

    pub fn start(&mut self, now: Instant) {
        if self.anchor_instant.is_none() {
            self.anchor_instant = Some(now);
        }
    }

    pub fn stop(&mut self, now: Instant) {
        self.anchor_secs = self.position(now);
        self.anchor_instant = None;
    }

    pub fn set_position(&mut self, secs: f64, now: Instant) {
        self.anchor_secs = sanitize_secs(secs);
        if self.anchor_instant.is_some() {
            self.anchor_instant = Some(now);
        }
    }

    pub fn set_rate(&mut self, rate: f64, now: Instant) {
        self.rebase(now);
        self.rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
    }

    fn rebase(&mut self, now: Instant) {
        if self.anchor_instant.is_some() {
            self.anchor_secs = self.position(now);
            self.anchor_instant = Some(now);
        }
    }
}

fn sanitize_secs(secs: f64) -> f64 {
    if secs.is_finite() { secs.max(0.0) } else { 0.0 }
}

/// Audio file played through the default output device.
pub struct AudioPlayback {
    path: PathBuf,
    _stream: OutputStream,
    sink: Sink,
    clock: PlaybackClock,
    duration: Option<Duration>,
    rate: f32,
    metadata_reported: bool,
    ended: bool,
}

impl AudioPlayback {
    pub fn open(path: &Path) -> Result<Self> {
        let (_stream, handle) = OutputStream::try_default().context("Opening audio output")?;
        let sink = Sink::try_new(&handle).context("Creating sink")?;
        sink.pause();
        let duration = append_file(&sink, path)?;
        info!(
            path = %path.display(),
            duration_secs = duration.map(|d| d.as_secs_f64()),
            "Loaded audio"
        );
        Ok(Self {
            path: path.to_path_buf(),
            _stream,
            sink,
            clock: PlaybackClock::default(),
            duration,
            rate: 1.0,
            metadata_reported: false,
            ended: false,
        })
    }

    fn restart_from_beginning(&mut self) -> Result<()> {
        debug!("Re-queueing audio after playback ended");
        self.sink.pause();
        self.duration = append_file(&self.sink, &self.path)?.or(self.duration);
        self.sink.set_speed(self.rate);
        self.clock.set_position(0.0, Instant::now());
        self.ended = false;
        Ok(())
    }
}

fn append_file(sink: &Sink, path: &Path) -> Result<Option<Duration>> {
    let file = File::open(path).with_context(|| format!("Opening {}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .with_context(|| format!("Decoding {}", path.display()))?;
    let duration = source.total_duration();
    sink.append(source);
    Ok(duration)
}

impl PlaybackSource for AudioPlayback {
    fn current_time(&self) -> f64 {
        let position = self.clock.position(Instant::now());
        match self.duration {
            Some(total) => position.min(total.as_secs_f64()),
            None => position,
        }
    }

    fn duration(&self) -> Option<f64> {
        self.duration.map(|d| d.as_secs_f64())
    }

    fn is_playing(&self) -> bool {
        !self.ended && !self.sink.is_paused()
    }

    fn play(&mut self) -> Result<()> {
        if self.ended {
            self.restart_from_beginning()?;
        }
        if self.sink.empty() {
            return Err(anyhow!("no audio queued for playback"));
        }
        self.sink.play();
        self.clock.start(Instant::now());
        debug!("Resuming playback");
        Ok(())
    }

    fn pause(&mut self) {
        debug!("Pausing playback");
        self.sink.pause();
        self.clock.stop(Instant::now());
    }

    fn seek(&mut self, time: f64) -> Result<()> {
        if self.ended {
            self.restart_from_beginning()?;
        }
        let target = sanitize_secs(time);
        self.sink
            .try_seek(Duration::from_secs_f64(target))
            .map_err(|err| anyhow!("seek to {target:.2}s failed: {err:?}"))?;
        self.clock.set_position(target, Instant::now());
        Ok(())
    }

    fn set_rate(&mut self, rate: f32) {
        let rate = rate.clamp(MIN_PLAYBACK_RATE, MAX_PLAYBACK_RATE);
        self.rate = rate;
        self.sink.set_speed(rate);
        self.clock.set_rate(f64::from(rate), Instant::now());
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume.clamp(MIN_VOLUME, MAX_VOLUME));
    }

    fn poll_events(&mut self) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        if !self.metadata_reported {
            if let Some(duration) = self.duration() {
                events.push(PlaybackEvent::MetadataLoaded { duration });
            }
            self.metadata_reported = true;
        }
        if self.ended || self.sink.is_paused() {
            return events;
        }
        events.push(PlaybackEvent::TimeAdvanced {
            time: self.current_time(),
        });
        if self.sink.empty() {
            info!("Playback reached the end of the audio");
            self.ended = true;
            self.clock.stop(Instant::now());
            events.push(PlaybackEvent::Ended);
        }
        events
    }
}
