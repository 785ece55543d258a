//! Entry point for the headless page-sync player.
//!
//! - Parse command-line arguments.
//! - Load configuration from `conf/config.toml` (or the given path).
//! - Run the bridge loop until the host quits or Ctrl-C is pressed.

use anyhow::{Result, anyhow};
use page_sync::config::load_config;
use page_sync::runtime;
use std::env;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const DEFAULT_CONFIG_PATH: &str = "conf/config.toml";

struct Args {
    audio_path: PathBuf,
    config_path: PathBuf,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args()?;
    let config = load_config(&args.config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        audio = %args.audio_path.display(),
        config = %args.config_path.display(),
        level = %config.log_level,
        "Starting page sync"
    );
    info!(
        max_retries = config.max_retries,
        retry_delay_ms = config.retry_delay_ms,
        smooth_scroll = config.smooth_scroll,
        origins = ?config.allowed_origins,
        "Active sync configuration"
    );
    runtime::run(&config, &args.audio_path)
}

fn parse_args() -> Result<Args> {
    let mut args = env::args().skip(1);
    let audio_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("Usage: page-sync <audio-file> [config.toml]"))?;
    if !audio_path.exists() {
        return Err(anyhow!("File not found: {}", audio_path.display()));
    }
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    Ok(Args {
        audio_path,
        config_path,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
