//! Song files: pretty-printed JSON.


use std::fs;
use std::path::Path;

use mtrak_types::Song;

use crate::error::{CoreError, CoreResult};

/// Read and validate a song file.
pub fn load_song(path: &Path) -> CoreResult<Song> {
    let contents = fs::read_to_string(path)?;
    let song: Song = serde_json::from_str(&contents).map_err(|e| {
        if e.is_data() {
            CoreError::Malformed(e.to_string())
        } else {
            CoreError::Json(e)
        }
    })?;
    song.validate().map_err(CoreError::Malformed)?;
    log::info!(
        target: "persistence",
        "loaded {} ({} patterns)",
        path.display(),
        song.patterns.len()
    );
    Ok(song)
}

/// Write `song` to `path`. The file is written next to the target and
/// renamed over it, so a failed save leaves the previous file intact.
pub fn save_song(song: &Song, path: &Path) -> CoreResult<()> {
    let json = serde_json::to_string_pretty(song)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    log::info!(target: "persistence", "saved {}", path.display());
    Ok(())
}
