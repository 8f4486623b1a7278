//! Song: tempo parameters, patterns and note-entry context.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;
use crate::scale::Scale;

/// Upper bound on patterns per song; playback reserves this many slots.
pub const MAX_PATTERNS: usize = 256;

/// Tempo parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Beats per minute.
    #[serde(default = "default_bpm")]
    pub bpm: u32,
    /// Lines (rows) per beat.
    #[serde(default = "default_lpb")]
    pub lpb: u32,
    /// Ticks per line.
    #[serde(default = "default_tpl")]
    pub tpl: u32,
}

fn default_bpm() -> u32 {
    120
}

fn default_lpb() -> u32 {
    4
}

fn default_tpl() -> u32 {
    6
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            bpm: default_bpm(),
            lpb: default_lpb(),
            tpl: default_tpl(),
        }
    }
}

impl Timing {
    pub fn ticks_per_beat(&self) -> u32 {
        self.tpl * self.lpb
    }

    /// `round(sample_rate / (bpm / 60) / (tpl * lpb))`, never below one frame.
    pub fn frames_per_tick(&self, sample_rate: u32) -> u64 {
        let beats_per_second = self.bpm.max(1) as f64 / 60.0;
        let ticks_per_beat = self.ticks_per_beat().max(1) as f64;
        let frames = (sample_rate as f64 / beats_per_second / ticks_per_beat).round();
        (frames as u64).max(1)
    }

    pub fn is_valid(&self) -> bool {
        self.bpm > 0 && self.lpb > 0 && self.tpl > 0
    }
}

/// Context used to turn key presses into notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteContext {
    #[serde(default = "default_root")]
    pub root: u8,
    #[serde(default)]
    pub scale: Scale,
    /// Degree offset into the scale.
    #[serde(default)]
    pub mode: usize,
    #[serde(default)]
    pub chromatic: bool,
}

fn default_root() -> u8 {
    48
}

impl Default for NoteContext {
    fn default() -> Self {
        Self {
            root: default_root(),
            scale: Scale::default(),
            mode: 0,
            chromatic: false,
        }
    }
}

impl NoteContext {
    pub fn new(root: u8) -> Self {
        Self {
            root: root.min(127),
            ..Self::default()
        }
    }

    /// MIDI note for a scale degree (or semitone offset in chromatic mode),
    /// capped at 127.
    pub fn degree_to_note(&self, degree: usize) -> u8 {
        let note = if self.chromatic {
            self.root as usize + degree
        } else {
            let intervals = self.scale.intervals();
            let degree = degree + self.mode;
            self.root as usize + (degree / intervals.len()) * 12 + intervals[degree % intervals.len()] as usize
        };
        note.min(127) as u8
    }

    /// Root rendered as `C-4`, `F#2`...
    pub fn root_name(&self) -> String {
        const NAMES: [&str; 12] = [
            "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
        ];
        format!("{}{}", NAMES[(self.root % 12) as usize], self.root / 12)
    }

    pub fn scale_code(&self) -> &'static str {
        if self.chromatic {
            "C"
        } else {
            self.scale.code()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(flatten)]
    pub timing: Timing,
    pub patterns: Vec<Arc<Pattern>>,
    #[serde(flatten)]
    pub notes: NoteContext,
}

impl Song {
    pub fn new(timing: Timing, pattern: Pattern) -> Self {
        let mut patterns = Vec::with_capacity(MAX_PATTERNS);
        patterns.push(Arc::new(pattern));
        Self {
            timing,
            patterns,
            notes: NoteContext::default(),
        }
    }

    pub fn pattern(&self, index: usize) -> Option<&Arc<Pattern>> {
        self.patterns.get(index)
    }

    /// Take over `other`'s content, reusing this song's pattern storage.
    /// Does not allocate while `other` has no more than `MAX_PATTERNS`
    /// patterns and this song was built with [`Song::new`] or
    /// [`Song::reserve_patterns`].
    pub fn assign_from(&mut self, other: &Song) {
        self.timing = other.timing;
        self.notes = other.notes;
        self.patterns.clear();
        self.patterns.extend(other.patterns.iter().cloned());
    }

    pub fn reserve_patterns(&mut self) {
        let missing = MAX_PATTERNS.saturating_sub(self.patterns.len());
        self.patterns.reserve(missing);
    }

    /// Check the invariants that deserialization alone does not cover.
    pub fn validate(&self) -> Result<(), String> {
        if self.timing.bpm == 0 {
            return Err("bpm must be positive".into());
        }
        if self.timing.lpb == 0 {
            return Err("lpb must be positive".into());
        }
        if self.timing.tpl == 0 {
            return Err("tpl must be positive".into());
        }
        if self.patterns.is_empty() {
            return Err("song has no patterns".into());
        }
        if self.patterns.len() > MAX_PATTERNS {
            return Err(format!("song has {} patterns (max {})", self.patterns.len(), MAX_PATTERNS));
        }
        if self.notes.root > 127 {
            return Err(format!("invalid root note: {}", self.notes.root));
        }
        if self.notes.mode >= self.notes.scale.len() {
            return Err(format!(
                "invalid mode {}: scale has only {} degrees",
                self.notes.mode,
                self.notes.scale.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    #[test]
    fn frames_per_tick_at_48k() {
        let timing = Timing { bpm: 120, lpb: 4, tpl: 6 };
        assert_eq!(timing.frames_per_tick(48000), 1000);
    }

    #[test]
    fn frames_per_tick_rounds() {
        let timing = Timing { bpm: 125, lpb: 4, tpl: 6 };
        // 44100 / (125/60) / 24 = 882
        assert_eq!(timing.frames_per_tick(44100), 882);
        let timing = Timing { bpm: 7, lpb: 3, tpl: 5 };
        // 44100 / (7/60) / 15 = 25200
        assert_eq!(timing.frames_per_tick(44100), 25200);
    }

    #[test]
    fn frames_per_tick_never_zero() {
        let timing = Timing { bpm: 100_000, lpb: 64, tpl: 64 };
        assert_eq!(timing.frames_per_tick(8000), 1);
    }

    #[test]
    fn degree_to_note_walks_the_scale() {
        let ctx = NoteContext::new(60);
        assert_eq!(ctx.degree_to_note(0), 60);
        assert_eq!(ctx.degree_to_note(2), 64);
        assert_eq!(ctx.degree_to_note(7), 72);

        let dorian = NoteContext { mode: 1, ..ctx };
        assert_eq!(dorian.degree_to_note(0), 62);
        assert_eq!(dorian.degree_to_note(6), 72);
    }

    #[test]
    fn degree_to_note_caps_at_127() {
        let ctx = NoteContext::new(120);
        assert_eq!(ctx.degree_to_note(14), 127);
        let chromatic = NoteContext { chromatic: true, ..ctx };
        assert_eq!(chromatic.degree_to_note(3), 123);
    }

    #[test]
    fn root_name_formats_octave() {
        assert_eq!(NoteContext::new(48).root_name(), "C-4");
        assert_eq!(NoteContext::new(30).root_name(), "F#2");
    }

    #[test]
    fn assign_from_copies_everything() {
        let mut a = Song::new(Timing::default(), Pattern::new(4, 1));
        let mut b = Song::new(Timing { bpm: 90, lpb: 3, tpl: 4 }, Pattern::new(8, 2));
        b.patterns.push(Arc::new(Pattern::new(2, 2)));
        b.notes.chromatic = true;
        a.assign_from(&b);
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.patterns[1], &b.patterns[1]));
    }

    #[test]
    fn json_uses_flat_field_names() {
        let mut pattern = Pattern::new(1, 1);
        pattern.set_event(0, 0, Event::new(0x90, 0x3c, 0x40));
        let mut song = Song::new(Timing::default(), pattern);
        song.notes.scale = Scale::Pentatonic;
        let json = serde_json::to_value(&song).unwrap();
        for key in ["bpm", "lpb", "tpl", "patterns", "root", "scale", "mode", "chromatic"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["scale"], 4);
        let back: Song = serde_json::from_value(json).unwrap();
        assert_eq!(back, song);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let json = serde_json::json!({
            "patterns": [{ "rows": [[[0, 0, 0]]], "numRows": 1, "numTracks": 1 }],
        });
        let song: Song = serde_json::from_value(json).unwrap();
        assert_eq!(song.timing, Timing::default());
        assert_eq!(song.notes.root, 48);
        assert!(song.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_timing() {
        let mut song = Song::new(Timing::default(), Pattern::new(1, 1));
        song.timing.tpl = 0;
        assert!(song.validate().is_err());
    }
}
