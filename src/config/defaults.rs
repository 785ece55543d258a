use super::models::{LogLevel, TimelineAnchor};

pub(crate) fn default_timeline_prefix() -> Vec<TimelineAnchor> {
    [93.0, 175.0, 258.0, 345.0, 414.0, 497.0, 585.0, 673.0]
        .into_iter()
        .zip(1u32..)
        .map(|(at, page)| TimelineAnchor { at, page })
        .collect()
}

pub(crate) fn default_average_item_secs() -> f64 {
    84.0
}

pub(crate) fn default_item_count() -> usize {
    108
}

pub(crate) fn default_total_pages() -> u32 {
    55
}

pub(crate) fn default_items_per_page() -> usize {
    2
}

pub(crate) fn default_item_label() -> String {
    "Shlokam".to_string()
}

pub(crate) fn default_max_retries() -> u32 {
    5
}

pub(crate) fn default_retry_delay_ms() -> u64 {
    300
}

pub(crate) fn default_tick_interval_ms() -> u64 {
    50
}

pub(crate) fn default_smooth_scroll() -> bool {
    true
}

pub(crate) fn default_playback_rate() -> f32 {
    1.0
}

pub(crate) fn default_volume() -> f32 {
    1.0
}

pub(crate) fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:8000".to_string()]
}

pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Debug
}
