//! Presentation helpers for the transport bar: clock text, progress and
//! per-item markers.

use crate::timeline::Timeline;
use serde::Serialize;
use ts_rs::TS;

/// Marker placed on the progress bar at the start of an item.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Marker {
    /// Position along the bar, 0 to 100.
    pub position_pct: f64,
    pub label: String,
}

/// `mm:ss`, with minutes allowed to grow past 99.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn time_display(current: f64, duration: Option<f64>) -> String {
    format!(
        "{} / {}",
        format_time(current),
        format_time(duration.unwrap_or(0.0))
    )
}

pub fn progress_percent(current: f64, duration: Option<f64>) -> Option<f64> {
    let duration = usable_duration(duration)?;
    let current = if current.is_finite() { current } else { 0.0 };
    Some((current / duration * 100.0).clamp(0.0, 100.0))
}

/// Time to seek to for a click at `fraction` of the bar width.
pub fn seek_target(fraction: f64, duration: Option<f64>) -> Option<f64> {
    let duration = usable_duration(duration)?;
    if !fraction.is_finite() {
        return None;
    }
    Some(duration * fraction.clamp(0.0, 1.0))
}

pub fn markers(timeline: &Timeline, duration: Option<f64>, label: &str) -> Vec<Marker> {
    let Some(duration) = usable_duration(duration) else {
        return Vec::new();
    };
    timeline
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.at <= duration)
        .map(|(idx, entry)| Marker {
            position_pct: entry.at / duration * 100.0,
            label: format!("{label} {}", idx + 1),
        })
        .collect()
}

fn usable_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}
