use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use mtrak_audio::{EngineConfig, PipelineConfig};
use mtrak_types::{NoteContext, Pattern, Scale, Song, Timing, MAX_ROWS, MAX_TRACKS};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
    #[serde(default)]
    midi: MidiConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    bpm: Option<u32>,
    lpb: Option<u32>,
    tpl: Option<u32>,
    rows: Option<usize>,
    tracks: Option<usize>,
    root: Option<u8>,
    scale: Option<String>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    queue_capacity: Option<usize>,
    submit_timeout_ms: Option<u64>,
    page_rows: Option<usize>,
}

#[derive(Deserialize, Default)]
struct MidiConfig {
    client_name: Option<String>,
    port_name: Option<String>,
}

pub struct Config {
    defaults: DefaultsConfig,
    runtime: RuntimeConfig,
    midi: MidiConfig,
}

impl Config {
    /// Embedded defaults overridden by `<config_dir>/mtrak/config.toml`.
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    pub fn load_from(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_runtime(&mut base.runtime, user.runtime);
                            merge_midi(&mut base.midi, user.midi);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            runtime: base.runtime,
            midi: base.midi,
        }
    }

    /// Tempo for new songs. Zero values fall back to the built-in defaults.
    pub fn timing(&self) -> Timing {
        let fallback = Timing::default();
        Timing {
            bpm: self.defaults.bpm.filter(|&v| v > 0).unwrap_or(fallback.bpm),
            lpb: self.defaults.lpb.filter(|&v| v > 0).unwrap_or(fallback.lpb),
            tpl: self.defaults.tpl.filter(|&v| v > 0).unwrap_or(fallback.tpl),
        }
    }

    pub fn rows(&self) -> usize {
        self.defaults.rows.unwrap_or(64).clamp(1, MAX_ROWS)
    }

    pub fn tracks(&self) -> usize {
        self.defaults.tracks.unwrap_or(8).clamp(1, MAX_TRACKS)
    }

    pub fn note_context(&self) -> NoteContext {
        let mut notes = NoteContext::new(self.defaults.root.unwrap_or(48));
        if let Some(scale) = self.defaults.scale.as_deref().and_then(parse_scale) {
            notes.scale = scale;
        }
        notes
    }

    /// An empty song with the configured defaults.
    pub fn new_song(&self) -> Song {
        let mut song = Song::new(self.timing(), Pattern::new(self.rows(), self.tracks()));
        song.notes = self.note_context();
        song
    }

    pub fn page_rows(&self) -> usize {
        self.runtime.page_rows.unwrap_or(16).max(1)
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            queue_capacity: self.runtime.queue_capacity.unwrap_or(64).clamp(1, 4096),
            submit_timeout: Duration::from_millis(self.runtime.submit_timeout_ms.unwrap_or(100)),
        }
    }

    pub fn engine(&self) -> EngineConfig {
        let fallback = EngineConfig::default();
        EngineConfig {
            client_name: self.midi.client_name.clone().unwrap_or(fallback.client_name),
            port_name: self.midi.port_name.clone().filter(|name| !name.is_empty()),
            event_capacity: fallback.event_capacity,
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mtrak").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.lpb.is_some() {
        base.lpb = user.lpb;
    }
    if user.tpl.is_some() {
        base.tpl = user.tpl;
    }
    if user.rows.is_some() {
        base.rows = user.rows;
    }
    if user.tracks.is_some() {
        base.tracks = user.tracks;
    }
    if user.root.is_some() {
        base.root = user.root;
    }
    if user.scale.is_some() {
        base.scale = user.scale;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.queue_capacity.is_some() {
        base.queue_capacity = user.queue_capacity;
    }
    if user.submit_timeout_ms.is_some() {
        base.submit_timeout_ms = user.submit_timeout_ms;
    }
    if user.page_rows.is_some() {
        base.page_rows = user.page_rows;
    }
}

fn merge_midi(base: &mut MidiConfig, user: MidiConfig) {
    if user.client_name.is_some() {
        base.client_name = user.client_name;
    }
    if user.port_name.is_some() {
        base.port_name = user.port_name;
    }
}

/// Accepts a scale's name or its short code.
pub fn parse_scale(s: &str) -> Option<Scale> {
    let s = s.trim();
    Scale::ALL
        .into_iter()
        .find(|scale| scale.code() == s)
        .or_else(|| {
            let lower = s.to_lowercase().replace(['_', '-'], " ");
            Scale::ALL.into_iter().find(|scale| scale.name() == lower)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults() {
        let config = Config::load_from(None);
        assert_eq!(config.timing(), Timing { bpm: 120, lpb: 4, tpl: 6 });
        assert_eq!(config.rows(), 64);
        assert_eq!(config.tracks(), 8);
        assert_eq!(config.note_context().root, 48);
        assert_eq!(config.page_rows(), 16);
        assert_eq!(config.pipeline().queue_capacity, 64);
        assert_eq!(config.pipeline().submit_timeout, Duration::from_millis(100));
        assert_eq!(config.engine().client_name, "mtrak");
        assert_eq!(config.engine().port_name, None);
    }

    #[test]
    fn user_file_overrides_single_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\nbpm = 140\nscale = \"hm\"\n[midi]\nport_name = \"Synth\"\n",
        )
        .unwrap();
        let config = Config::load_from(Some(&path));
        assert_eq!(config.timing().bpm, 140);
        assert_eq!(config.timing().lpb, 4);
        assert_eq!(config.note_context().scale, Scale::HarmonicMinor);
        assert_eq!(config.engine().port_name.as_deref(), Some("Synth"));
        assert_eq!(config.engine().client_name, "mtrak");
    }

    #[test]
    fn malformed_user_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults\nbpm = ").unwrap();
        let config = Config::load_from(Some(&path));
        assert_eq!(config.timing(), Timing::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults]\nbpm = 0\ntracks = 500\nrows = 0\n").unwrap();
        let config = Config::load_from(Some(&path));
        assert_eq!(config.timing().bpm, 120);
        assert_eq!(config.tracks(), MAX_TRACKS);
        assert_eq!(config.rows(), 1);
        let song = config.new_song();
        assert_eq!(song.patterns[0].num_tracks(), MAX_TRACKS);
    }

    #[test]
    fn parse_scale_accepts_names_and_codes() {
        assert_eq!(parse_scale("m"), Some(Scale::NaturalMinor));
        assert_eq!(parse_scale("M"), Some(Scale::Major));
        assert_eq!(parse_scale("Whole-Tone"), Some(Scale::WholeTone));
        assert_eq!(parse_scale("blues"), None);
    }
}
