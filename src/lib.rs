//! Audio-synchronized page navigation for a paginated document viewer.
//!
//! A recitation is played back while the viewer is kept on the page that
//! matches the current item. The library is host-agnostic: the viewer and
//! the audio clock sit behind traits, and [`runtime`] wires them to a
//! JSON-lines bridge for the bundled binary.

pub mod bridge;
pub mod command;
pub mod config;
pub mod playback;
pub mod progress;
pub mod runtime;
pub mod session;
pub mod sync;
pub mod timeline;
pub mod tracker;
pub mod viewer;

#[cfg(test)]
mod test_support;

use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

/// Write TypeScript declarations for every type crossing the bridge.
pub fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir)
        .map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<command::PageRequest>(out_dir)?;
    export_single_type::<bridge::BridgeInput>(out_dir)?;
    export_single_type::<bridge::BridgeOutput>(out_dir)?;
    export_single_type::<session::SessionStatus>(out_dir)?;
    export_single_type::<progress::Marker>(out_dir)?;
    Ok(())
}
