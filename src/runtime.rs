//! Headless event loop driving a [`Session`] over the JSON-lines bridge.
//!
//! Host reports arrive on stdin and are read by a dedicated thread; output
//! lines go to stdout. Logs are written to stderr so they never interleave
//! with the protocol.

use crate::bridge::{self, BridgeOutput, BridgeViewer, Control, OutputCollector};
use crate::config::AppConfig;
use crate::playback::{AudioPlayback, PlaybackSource};
use crate::session::{Session, SessionEvent};
use crate::timeline::{Timeline, TimelineSpec};
use crate::viewer::ViewerAdapter;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const MIN_SLEEP: Duration = Duration::from_millis(1);

pub fn run(config: &AppConfig, audio_path: &Path) -> Result<()> {
    let timeline = Timeline::build(&TimelineSpec::from(config)).context("Building timeline")?;
    info!(
        items = timeline.len(),
        pages = timeline.total_pages(),
        "Timeline ready"
    );

    let mut playback = AudioPlayback::open(audio_path)?;
    playback.set_rate(config.playback_rate);
    playback.set_volume(config.volume);

    let mut session = Session::new(
        playback,
        ViewerAdapter::new(Some(BridgeViewer::new())),
        timeline,
        config,
    );

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("Installing Ctrl-C handler")?;
    }

    let lines = spawn_stdin_reader()?;
    let mut collector = OutputCollector::new();
    let tick = config.tick_interval();
    let stdout = io::stdout();

    info!(tick_ms = tick.as_millis() as u64, "Waiting for host events");
    while running.load(Ordering::SeqCst) {
        if drain_inputs(&lines, &mut session, Instant::now()) == Control::Quit {
            break;
        }
        session.handle(SessionEvent::Tick, Instant::now());
        write_outputs(&mut stdout.lock(), &collector.collect(&mut session))?;

        let now = Instant::now();
        thread::sleep(sleep_for(tick, session.engine().next_deadline(), now));
    }

    info!("Shutting down");
    session.handle(SessionEvent::Pause, Instant::now());
    write_outputs(&mut stdout.lock(), &collector.collect(&mut session))?;
    Ok(())
}

fn spawn_stdin_reader() -> Result<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("bridge-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!("Failed to read host input: {err}");
                        break;
                    }
                }
            }
            debug!("Host input closed");
        })
        .context("Spawning stdin reader")?;
    Ok(rx)
}

/// Apply every line received so far. A closed input stream ends the loop.
fn drain_inputs<P: PlaybackSource>(
    lines: &Receiver<String>,
    session: &mut Session<P, BridgeViewer>,
    now: Instant,
) -> Control {
    loop {
        match lines.try_recv() {
            Ok(line) => {
                let Some(input) = bridge::parse_bridge_line(&line) else {
                    continue;
                };
                if bridge::apply_input(session, input, now) == Control::Quit {
                    info!("Host requested shutdown");
                    return Control::Quit;
                }
            }
            Err(TryRecvError::Empty) => return Control::Continue,
            Err(TryRecvError::Disconnected) => {
                info!("Host closed the bridge");
                return Control::Quit;
            }
        }
    }
}

fn write_outputs<W: Write>(out: &mut W, outputs: &[BridgeOutput]) -> Result<()> {
    if outputs.is_empty() {
        return Ok(());
    }
    for output in outputs {
        let line = serde_json::to_string(output).context("Encoding bridge output")?;
        writeln!(out, "{line}").context("Writing bridge output")?;
    }
    out.flush().context("Flushing bridge output")?;
    Ok(())
}

/// Sleep until the next tick, waking early for a due retry timer.
fn sleep_for(tick: Duration, deadline: Option<Instant>, now: Instant) -> Duration {
    let until_deadline = deadline
        .map(|deadline| deadline.saturating_duration_since(now))
        .unwrap_or(tick);
    tick.min(until_deadline).max(MIN_SLEEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimelineAnchor;
    use crate::test_support::FakePlayback;

    fn session() -> Session<FakePlayback, BridgeViewer> {
        let config = AppConfig {
            timeline_prefix: vec![TimelineAnchor { at: 0.0, page: 1 }],
            item_count: 4,
            total_pages: 2,
            ..AppConfig::default()
        };
        let timeline = Timeline::build(&TimelineSpec::from(&config)).expect("timeline");
        Session::new(
            FakePlayback::with_duration(300.0),
            ViewerAdapter::new(Some(BridgeViewer::new())),
            timeline,
            &config,
        )
    }

    #[test]
    fn sleep_wakes_for_retry_deadline() {
        let tick = Duration::from_millis(50);
        let now = Instant::now();
        assert_eq!(sleep_for(tick, None, now), tick);
        assert_eq!(
            sleep_for(tick, Some(now + Duration::from_millis(20)), now),
            Duration::from_millis(20)
        );
        assert_eq!(sleep_for(tick, Some(now), now), MIN_SLEEP);
    }

    #[test]
    fn writes_one_json_object_per_line() {
        let mut buffer = Vec::new();
        write_outputs(
            &mut buffer,
            &[
                BridgeOutput::GotoPage { page_number: 2 },
                BridgeOutput::Notice {
                    message: "hello".to_string(),
                },
            ],
        )
        .expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(
            text,
            concat!(
                "{\"type\":\"gotoPage\",\"pageNumber\":2}\n",
                "{\"type\":\"notice\",\"message\":\"hello\"}\n",
            )
        );
    }

    #[test]
    fn drain_applies_lines_until_quit() {
        let mut session = session();
        let (tx, rx) = mpsc::channel();
        tx.send(r#"{"event":"play"}"#.to_string()).expect("send");
        tx.send("garbage".to_string()).expect("send");
        assert_eq!(drain_inputs(&rx, &mut session, Instant::now()), Control::Continue);
        assert!(session.is_playing());

        tx.send(r#"{"event":"quit"}"#.to_string()).expect("send");
        tx.send(r#"{"event":"pause"}"#.to_string()).expect("send");
        assert_eq!(drain_inputs(&rx, &mut session, Instant::now()), Control::Quit);
        assert!(session.is_playing());
    }

    #[test]
    fn closed_input_ends_the_loop() {
        let mut session = session();
        let (tx, rx) = mpsc::channel::<String>();
        drop(tx);
        assert_eq!(drain_inputs(&rx, &mut session, Instant::now()), Control::Quit);
    }
}
