//! Configuration loading for the page synchronizer.
//!
//! Settings live in `conf/config.toml`, grouped into `[timeline]`, `[sync]`,
//! `[playback]`, `[messaging]` and `[logging]` tables. Missing entries fall
//! back to defaults that reproduce the stock 108-item, 55-page recitation.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{AppConfig, LogLevel, TimelineAnchor};
