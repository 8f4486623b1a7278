pub mod clipboard;
pub mod geometry;
pub mod mode;
pub mod persistence;
pub mod undo;

pub use clipboard::Clipboard;
pub use geometry::EditState;
pub use mode::{Mode, ModeStack};
pub use undo::{UndoHistory, MAX_UNDOABLE_ACTIONS};

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use mtrak_types::{Event, Op, Pattern, Size, Song, TrackResize};

/// Playback position as last reported by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransportView {
    pub is_playing: bool,
    pub play_row: usize,
    pub play_from_row: usize,
}

/// Edit-side state: the song replica plus everything the editor needs
/// around it.
pub struct AppState {
    pub song: Song,
    pub edit: EditState,
    pub history: UndoHistory,
    pub clipboard: Clipboard,
    pub modes: ModeStack,
    pub transport: TransportView,
    pub filename: Option<PathBuf>,
    /// The single current error, shown until the next successful change.
    pub error: Option<String>,
    pub page_rows: usize,
    /// Events playback reported as never reaching the MIDI port.
    pub lost_events: u64,
    /// Track defaults reported by playback, keyed by (pattern, track).
    played_defaults: BTreeMap<(usize, usize), Event>,
    /// Loads submitted but not yet reported back.
    pending_loads: usize,
    /// Track resizes submitted but not yet reported back. Reports sent
    /// before playback applied them still use the old track numbers.
    pending_resizes: VecDeque<(usize, TrackResize)>,
}

impl AppState {
    pub fn new(song: Song) -> Self {
        let mut state = Self {
            song,
            edit: EditState::new(),
            history: UndoHistory::default(),
            clipboard: Clipboard::default(),
            modes: ModeStack::default(),
            transport: TransportView::default(),
            filename: None,
            error: None,
            page_rows: 16,
            lost_events: 0,
            played_defaults: BTreeMap::new(),
            pending_loads: 0,
            pending_resizes: VecDeque::new(),
        };
        state.fix();
        state
    }

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    pub fn pattern(&self) -> &Arc<Pattern> {
        &self.song.patterns[self.edit.edit_pattern]
    }

    /// Extent of the edited pattern in digits and rows.
    pub fn bounds(&self) -> Size {
        self.pattern().size()
    }

    /// Apply an op that has just been handed to playback.
    pub fn apply(&mut self, op: &Op) {
        match op {
            Op::ReplacePattern { index, pattern } => {
                let from = self.song.pattern(*index).map(|p| p.num_tracks());
                if let Some(from) = from.filter(|&n| n != pattern.num_tracks()) {
                    let to = pattern.num_tracks();
                    self.shift_played_defaults(*index, TrackResize::new(from, to, to));
                }
            }
            Op::ResizeTracks { index, pattern, at } => {
                if let Some(from) = self.song.pattern(*index).map(|p| p.num_tracks()) {
                    let resize = TrackResize::new(from, pattern.num_tracks(), *at);
                    self.shift_played_defaults(*index, resize);
                    self.pending_resizes.push_back((*index, resize));
                }
            }
            Op::LoadSong { .. } => {
                self.pending_loads += 1;
                self.reset();
            }
            Op::Play { from_row } => {
                self.transport.is_playing = true;
                self.transport.play_row = self
                    .song
                    .patterns
                    .first()
                    .map_or(0, |p| (*from_row).min(p.num_rows() - 1));
            }
            Op::Stop => self.transport.is_playing = false,
            Op::SetTiming(_) | Op::SetNoteContext(_) => {}
        }
        op.apply(&mut self.song);
        self.fix();
    }

    fn shift_played_defaults(&mut self, index: usize, resize: TrackResize) {
        let moved: Vec<(usize, Event)> = self
            .played_defaults
            .range((index, 0)..(index + 1, 0))
            .map(|(&(_, track), &event)| (track, event))
            .collect();
        self.played_defaults.retain(|&(p, _), _| p != index);
        for (track, event) in moved {
            if let Some(track) = resize.map(track) {
                self.played_defaults.insert((index, track), event);
            }
        }
    }

    /// Clamp the cursor, brush and selection into the current song.
    pub fn fix(&mut self) {
        let patterns = self.song.patterns.len();
        self.edit.edit_pattern = self.edit.edit_pattern.min(patterns.saturating_sub(1));
        let bounds = self.bounds();
        self.edit.fix(bounds, patterns);
        if self.transport.play_from_row >= bounds.h as usize {
            self.transport.play_from_row = 0;
        }
    }

    fn reset(&mut self) {
        self.edit = EditState::new();
        self.history.clear();
        self.clipboard.clear();
        self.modes.reset();
        self.transport = TransportView::default();
        self.played_defaults.clear();
        self.pending_resizes.clear();
    }

    /// Record a report from playback. Reports for a song that has since been
    /// replaced by a load are dropped.
    pub fn record_applied(&mut self, action: mtrak_types::Action) {
        if matches!(action.op, Op::LoadSong { .. }) {
            self.pending_loads = self.pending_loads.saturating_sub(1);
            return;
        }
        if self.pending_loads == 0 {
            if matches!(action.op, Op::ResizeTracks { .. }) {
                self.pending_resizes.pop_front();
            }
            self.history.record(action);
        }
    }

    pub fn record_track_default(&mut self, pattern: usize, track: usize, event: Event) {
        if self.pending_loads > 0 {
            return;
        }
        let mut track = track;
        for (index, resize) in &self.pending_resizes {
            if *index != pattern {
                continue;
            }
            match resize.map(track) {
                Some(moved) => track = moved,
                None => return,
            }
        }
        let in_song = self
            .song
            .pattern(pattern)
            .is_some_and(|p| track < p.num_tracks());
        if in_song {
            self.played_defaults.insert((pattern, track), event);
        }
    }

    /// Default for a track: the last event playback emitted on it, or the
    /// one stored in the pattern.
    pub fn track_default(&self, pattern: usize, track: usize) -> Event {
        if let Some(event) = self.played_defaults.get(&(pattern, track)) {
            return *event;
        }
        self.song
            .pattern(pattern)
            .and_then(|p| p.track_defaults().get(track).copied())
            .unwrap_or(Event::EMPTY)
    }

    /// The song as it should be saved, with played defaults folded in.
    pub fn song_for_save(&self) -> Song {
        let mut song = self.song.clone();
        for (&(pattern, track), &event) in &self.played_defaults {
            if let Some(p) = song.patterns.get_mut(pattern) {
                Arc::make_mut(p).set_track_default(track, event);
            }
        }
        song
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtrak_types::{Action, Timing};

    fn state() -> AppState {
        AppState::new(Song::new(Timing::default(), Pattern::new(8, 2)))
    }

    #[test]
    fn reports_after_load_are_ignored_until_load_reported() {
        let mut s = state();
        let stale = Action::new(Op::SetTiming(Timing::default()), Some(Op::SetTiming(Timing::default())));
        let load = Op::LoadSong {
            song: Arc::new(s.song.clone()),
            previous: Arc::new(s.song.clone()),
        };
        s.apply(&load);
        s.record_applied(stale.clone());
        assert!(!s.history.can_undo());
        s.record_applied(Action::new(load, None));
        s.record_applied(stale);
        assert!(s.history.can_undo());
    }

    #[test]
    fn played_defaults_fold_into_saved_song() {
        let mut s = state();
        let ev = Event::new(0x91, 0x40, 0x50);
        s.record_track_default(0, 1, ev);
        s.record_track_default(0, 9, ev);
        assert_eq!(s.track_default(0, 1), ev);
        assert_eq!(s.song.patterns[0].track_defaults()[1], Event::EMPTY);
        let saved = s.song_for_save();
        assert_eq!(saved.patterns[0].track_defaults()[1], ev);
    }

    #[test]
    fn played_defaults_follow_track_resize() {
        let mut s = state();
        let ev = Event::new(0x91, 0x40, 0x50);
        s.record_track_default(0, 0, ev);
        s.record_track_default(0, 1, Event::new(0x92, 0x40, 0x50));
        let wider = s.pattern().with_num_tracks(3, 0);
        s.apply(&Op::ResizeTracks { index: 0, pattern: Arc::new(wider), at: 0 });
        assert_eq!(s.track_default(0, 0), Event::EMPTY);
        assert_eq!(s.track_default(0, 1), ev);

        let narrower = s.pattern().with_num_tracks(2, 2);
        s.apply(&Op::ResizeTracks { index: 0, pattern: Arc::new(narrower), at: 2 });
        assert_eq!(s.track_default(0, 1), ev);
        assert_eq!(s.song_for_save().patterns[0].track_defaults()[1], ev);
    }

    #[test]
    fn reports_in_flight_across_resize_are_renumbered() {
        let mut s = state();
        let wider = s.pattern().with_num_tracks(3, 0);
        let resize = Op::ResizeTracks { index: 0, pattern: Arc::new(wider), at: 0 };
        s.apply(&resize);

        // sent by playback before it saw the resize
        let ev = Event::new(0x91, 0x40, 0x50);
        s.record_track_default(0, 0, ev);
        assert_eq!(s.track_default(0, 1), ev);

        s.record_applied(Action::new(resize, None));
        s.record_track_default(0, 0, Event::new(0x90, 1, 1));
        assert_eq!(s.track_default(0, 0), Event::new(0x90, 1, 1));
        assert_eq!(s.track_default(0, 1), ev);
    }

    #[test]
    fn play_row_is_clamped_to_pattern() {
        let mut s = state();
        s.apply(&Op::Play { from_row: 99 });
        assert_eq!(s.transport.play_row, 7);
    }

    #[test]
    fn shrinking_pattern_fixes_cursor() {
        let mut s = state();
        let bounds = s.bounds();
        s.edit.jump_bottom_right(bounds);
        let shorter = s.pattern().with_num_rows(3, 3);
        s.apply(&Op::ReplacePattern { index: 0, pattern: Arc::new(shorter) });
        assert_eq!(s.edit.edit_pos.y, 2);
    }
}
