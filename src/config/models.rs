use serde::Deserialize;
use std::time::Duration;

/// Flattened runtime configuration, built from the sectioned TOML tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub timeline_prefix: Vec<TimelineAnchor>,
    pub average_item_secs: f64,
    pub item_count: usize,
    pub total_pages: u32,
    pub items_per_page: usize,
    pub item_label: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub tick_interval_ms: u64,
    pub smooth_scroll: bool,
    pub playback_rate: f32,
    pub volume: f32,
    pub allowed_origins: Vec<String>,
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            timeline_prefix: crate::config::defaults::default_timeline_prefix(),
            average_item_secs: crate::config::defaults::default_average_item_secs(),
            item_count: crate::config::defaults::default_item_count(),
            total_pages: crate::config::defaults::default_total_pages(),
            items_per_page: crate::config::defaults::default_items_per_page(),
            item_label: crate::config::defaults::default_item_label(),
            max_retries: crate::config::defaults::default_max_retries(),
            retry_delay_ms: crate::config::defaults::default_retry_delay_ms(),
            tick_interval_ms: crate::config::defaults::default_tick_interval_ms(),
            smooth_scroll: crate::config::defaults::default_smooth_scroll(),
            playback_rate: crate::config::defaults::default_playback_rate(),
            volume: crate::config::defaults::default_volume(),
            allowed_origins: crate::config::defaults::default_allowed_origins(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Loop cadence; never zero so the runtime cannot spin.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// One explicitly authored `(timestamp, page)` pair of the timeline.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq)]
pub struct TimelineAnchor {
    /// Seconds into the recording at which the item starts.
    pub at: f64,
    /// 1-based document page holding the item.
    pub page: u32,
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
