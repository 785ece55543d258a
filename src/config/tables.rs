use super::defaults;
use super::models::{AppConfig, LogLevel, TimelineAnchor};
use serde::Deserialize;

/// On-disk layout of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    timeline: TimelineConfig,
    #[serde(default)]
    sync: SyncConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    messaging: MessagingConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            timeline_prefix: tables.timeline.prefix,
            average_item_secs: tables.timeline.average_item_secs,
            item_count: tables.timeline.item_count,
            total_pages: tables.timeline.total_pages,
            items_per_page: tables.timeline.items_per_page,
            item_label: tables.timeline.item_label,
            max_retries: tables.sync.max_retries,
            retry_delay_ms: tables.sync.retry_delay_ms,
            tick_interval_ms: tables.sync.tick_interval_ms,
            smooth_scroll: tables.sync.smooth_scroll,
            playback_rate: tables.playback.rate,
            volume: tables.playback.volume,
            allowed_origins: tables.messaging.allowed_origins,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            timeline: TimelineConfig {
                prefix: config.timeline_prefix.clone(),
                average_item_secs: config.average_item_secs,
                item_count: config.item_count,
                total_pages: config.total_pages,
                items_per_page: config.items_per_page,
                item_label: config.item_label.clone(),
            },
            sync: SyncConfig {
                max_retries: config.max_retries,
                retry_delay_ms: config.retry_delay_ms,
                tick_interval_ms: config.tick_interval_ms,
                smooth_scroll: config.smooth_scroll,
            },
            playback: PlaybackConfig {
                rate: config.playback_rate,
                volume: config.volume,
            },
            messaging: MessagingConfig {
                allowed_origins: config.allowed_origins.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct TimelineConfig {
    #[serde(default = "defaults::default_timeline_prefix")]
    prefix: Vec<TimelineAnchor>,
    #[serde(default = "defaults::default_average_item_secs")]
    average_item_secs: f64,
    #[serde(default = "defaults::default_item_count")]
    item_count: usize,
    #[serde(default = "defaults::default_total_pages")]
    total_pages: u32,
    #[serde(default = "defaults::default_items_per_page")]
    items_per_page: usize,
    #[serde(default = "defaults::default_item_label")]
    item_label: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        TimelineConfig {
            prefix: defaults::default_timeline_prefix(),
            average_item_secs: defaults::default_average_item_secs(),
            item_count: defaults::default_item_count(),
            total_pages: defaults::default_total_pages(),
            items_per_page: defaults::default_items_per_page(),
            item_label: defaults::default_item_label(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct SyncConfig {
    #[serde(default = "defaults::default_max_retries")]
    max_retries: u32,
    #[serde(default = "defaults::default_retry_delay_ms")]
    retry_delay_ms: u64,
    #[serde(default = "defaults::default_tick_interval_ms")]
    tick_interval_ms: u64,
    #[serde(default = "defaults::default_smooth_scroll")]
    smooth_scroll: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            max_retries: defaults::default_max_retries(),
            retry_delay_ms: defaults::default_retry_delay_ms(),
            tick_interval_ms: defaults::default_tick_interval_ms(),
            smooth_scroll: defaults::default_smooth_scroll(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_playback_rate")]
    rate: f32,
    #[serde(default = "defaults::default_volume")]
    volume: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            rate: defaults::default_playback_rate(),
            volume: defaults::default_volume(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct MessagingConfig {
    #[serde(default = "defaults::default_allowed_origins")]
    allowed_origins: Vec<String>,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        MessagingConfig {
            allowed_origins: defaults::default_allowed_origins(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
