//! Reversible operations that travel from the edit side to playback.
//!
//! An [`Op`] carries all of its data explicitly, so applying the same sequence
//! of ops to two replicas of a [`Song`] yields the same result on both.

use std::sync::Arc;

use crate::event::Event;
use crate::pattern::Pattern;
use crate::song::{NoteContext, Song, Timing};

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Swap the pattern at `index`.
    ReplacePattern { index: usize, pattern: Arc<Pattern> },
    /// Swap the pattern at `index` for one with tracks inserted or removed
    /// at track `at`. Per-track playback state shifts the same way.
    ResizeTracks {
        index: usize,
        pattern: Arc<Pattern>,
        at: usize,
    },
    SetTiming(Timing),
    SetNoteContext(NoteContext),
    /// Replace the whole song. `previous` keeps the displaced song alive until
    /// the action is dropped on the edit side.
    LoadSong { song: Arc<Song>, previous: Arc<Song> },
    Play { from_row: usize },
    Stop,
}

impl Op {
    /// Apply to a song replica. Transport ops leave the song untouched.
    ///
    /// Never allocates as long as the song's pattern storage was reserved
    /// up front; out-of-range pattern indices are ignored.
    pub fn apply(&self, song: &mut Song) {
        match self {
            Op::ReplacePattern { index, pattern } | Op::ResizeTracks { index, pattern, .. } => {
                if let Some(slot) = song.patterns.get_mut(*index) {
                    *slot = Arc::clone(pattern);
                }
            }
            Op::SetTiming(timing) => song.timing = *timing,
            Op::SetNoteContext(notes) => song.notes = *notes,
            Op::LoadSong { song: next, .. } => song.assign_from(next),
            Op::Play { .. } | Op::Stop => {}
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Op::ReplacePattern { .. } => "replace-pattern",
            Op::ResizeTracks { .. } => "resize-tracks",
            Op::SetTiming(_) => "set-timing",
            Op::SetNoteContext(_) => "set-note-context",
            Op::LoadSong { .. } => "load-song",
            Op::Play { .. } => "play",
            Op::Stop => "stop",
        }
    }
}

/// Where an action came from. Only user actions invalidate the redo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Undo,
    Redo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub op: Op,
    /// Absent for actions that are not recorded in the history.
    pub undo: Option<Op>,
    pub origin: Origin,
}

impl Action {
    pub fn new(op: Op, undo: Option<Op>) -> Self {
        Self {
            op,
            undo,
            origin: Origin::User,
        }
    }

    pub fn is_undoable(&self) -> bool {
        self.undo.is_some()
    }
}

/// Messages from the playback side back to the edit side.
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    /// The action has been applied to the playback replica.
    Applied(Action),
    /// Playback moved to `row`.
    Redraw { row: usize },
    /// A track default changed while playing.
    TrackDefault {
        pattern: usize,
        track: usize,
        event: Event,
    },
    /// Scheduler timing summary in microseconds.
    Telemetry {
        avg_us: u32,
        max_us: u32,
        p95_us: u32,
        overruns: u32,
        /// Cumulative events that never reached the MIDI port.
        lost_events: u64,
    },
}
