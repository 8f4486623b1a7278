//! User intents for the dispatch system.
//!
//! Input decoding turns keys and typed commands into a [`UserAction`];
//! [`crate::dispatch::dispatch_action`] turns it into state changes and
//! submitted [`mtrak_types::Action`]s.

use std::path::PathBuf;

use crate::state::Mode;

/// Cursor, brush and selection movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    NextTrack,
    PrevTrack,
    FirstRow,
    LastRow,
    TopLeft,
    BottomRight,
    /// Toggle-expand the brush width; the sign is the direction.
    StepWidth(i32),
    StepHeight(i32),
    IncBrushWidth,
    DecBrushWidth,
    IncBrushHeight,
    DecBrushHeight,
    IncSelectionWidth,
    DecSelectionWidth,
    IncSelectionHeight,
    DecSelectionHeight,
    CollapseBrush,
}

/// Pattern mutations. Each one is submitted as an undoable pattern
/// replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    InsertDigit(u8),
    ZeroBlock,
    InsertBlock,
    DeleteBlock,
    BackspaceBlock,
    Cut,
    Copy,
    Paste,
    InsertTrack,
    DeleteTrack,
}

/// Note entry and note-context adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteAction {
    /// Enter a scale degree, mapped through the song's note context.
    Degree(usize),
    /// Enter a MIDI note number as is.
    Note(u8),
    ClearNote,
    RootUp,
    RootDown,
    OctaveUp,
    OctaveDown,
    NextScale,
    PrevScale,
    NextMode,
    PrevMode,
    ToggleChromatic,
}

/// Transport and file actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    Play,
    Stop,
    PlayOrStop,
    SetPlayFromRow,
    Load(Option<PathBuf>),
    Save(Option<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Nav(NavAction),
    Edit(EditAction),
    Note(NoteAction),
    Session(SessionAction),
    EnterMode(Mode),
    LeaveMode,
    Undo,
    Redo,
    /// A typed command line, e.g. `bpm 140`.
    Command(String),
    Quit,
    None,
}

/// Result of dispatching an action, for the UI layer to act on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchResult {
    pub quit: bool,
    pub status: Vec<String>,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_quit() -> Self {
        Self {
            quit: true,
            ..Self::default()
        }
    }

    pub fn with_status(message: impl Into<String>) -> Self {
        Self {
            status: vec![message.into()],
            ..Self::default()
        }
    }

    pub fn push_status(&mut self, message: impl Into<String>) {
        self.status.push(message.into());
    }

    pub fn merge(&mut self, other: DispatchResult) {
        self.quit = self.quit || other.quit;
        self.status.extend(other.status);
    }
}
