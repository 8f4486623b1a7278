//! Typed action identifiers for the keybinding system.
//!
//! Each layer in keybindings.toml names its actions with strings; these
//! enums are the parsed form, and [`ActionId::to_user_action`] maps them onto
//! the core's [`UserAction`].

use mtrak_core::action::{EditAction, NavAction, NoteAction, SessionAction, UserAction};
use mtrak_core::state::Mode;

/// Macro to generate action enums with string conversion methods
macro_rules! define_action_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $str:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )*
        }
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $str, )*
                }
            }
            pub fn from_str(s: &str) -> Option<Self> {
                match s {
                    $( $str => Some($name::$variant), )*
                    _ => None,
                }
            }
        }
    }
}

define_action_enum! {
    /// Available in every mode
    pub enum GlobalActionId {
        Quit => "quit",
        Undo => "undo",
        Redo => "redo",
        Save => "save",
        PlayOrStop => "play_or_stop",
        SetPlayRow => "set_play_row",
        Command => "command",
        NoteMode => "note_mode",
        Leave => "leave",
    }
}

define_action_enum! {
    /// Grid editing: edit and select modes
    pub enum GridActionId {
        Up => "up",
        Down => "down",
        Left => "left",
        Right => "right",
        PageUp => "page_up",
        PageDown => "page_down",
        NextTrack => "next_track",
        PrevTrack => "prev_track",
        FirstRow => "first_row",
        LastRow => "last_row",
        TopLeft => "top_left",
        BottomRight => "bottom_right",
        ExpandRight => "expand_right",
        ExpandLeft => "expand_left",
        ExpandDown => "expand_down",
        ExpandUp => "expand_up",
        IncBrushWidth => "inc_brush_width",
        DecBrushWidth => "dec_brush_width",
        IncBrushHeight => "inc_brush_height",
        DecBrushHeight => "dec_brush_height",
        IncSelectionWidth => "inc_selection_width",
        DecSelectionWidth => "dec_selection_width",
        IncSelectionHeight => "inc_selection_height",
        DecSelectionHeight => "dec_selection_height",
        ZeroBlock => "zero_block",
        InsertBlock => "insert_block",
        DeleteBlock => "delete_block",
        BackspaceBlock => "backspace_block",
        Cut => "cut",
        Copy => "copy",
        Paste => "paste",
        InsertTrack => "insert_track",
        DeleteTrack => "delete_track",
    }
}

define_action_enum! {
    /// Note mode
    pub enum NoteActionId {
        Up => "up",
        Down => "down",
        NextTrack => "next_track",
        PrevTrack => "prev_track",
        ClearNote => "clear_note",
        RootUp => "root_up",
        RootDown => "root_down",
        OctaveUp => "octave_up",
        OctaveDown => "octave_down",
        NextScale => "next_scale",
        PrevScale => "prev_scale",
        NextMode => "next_mode",
        PrevMode => "prev_mode",
        ToggleChromatic => "toggle_chromatic",
    }
}

/// Unified action identifier across all layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    Global(GlobalActionId),
    Grid(GridActionId),
    Note(NoteActionId),
}

impl ActionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::Global(a) => a.as_str(),
            ActionId::Grid(a) => a.as_str(),
            ActionId::Note(a) => a.as_str(),
        }
    }

    pub fn to_user_action(self) -> UserAction {
        match self {
            ActionId::Global(a) => global_action(a),
            ActionId::Grid(a) => grid_action(a),
            ActionId::Note(a) => note_action(a),
        }
    }
}

/// Parse an action string in the context of a layer.
pub fn parse_action_id(layer: &str, action: &str) -> Option<ActionId> {
    match layer {
        "global" => GlobalActionId::from_str(action).map(ActionId::Global),
        "edit" => GridActionId::from_str(action).map(ActionId::Grid),
        "note" => NoteActionId::from_str(action).map(ActionId::Note),
        _ => None,
    }
}

fn global_action(id: GlobalActionId) -> UserAction {
    match id {
        GlobalActionId::Quit => UserAction::Quit,
        GlobalActionId::Undo => UserAction::Undo,
        GlobalActionId::Redo => UserAction::Redo,
        GlobalActionId::Save => UserAction::Session(SessionAction::Save(None)),
        GlobalActionId::PlayOrStop => UserAction::Session(SessionAction::PlayOrStop),
        GlobalActionId::SetPlayRow => UserAction::Session(SessionAction::SetPlayFromRow),
        GlobalActionId::Command => UserAction::EnterMode(Mode::Command),
        GlobalActionId::NoteMode => UserAction::EnterMode(Mode::Note),
        GlobalActionId::Leave => UserAction::LeaveMode,
    }
}

fn grid_action(id: GridActionId) -> UserAction {
    let nav = |a| UserAction::Nav(a);
    let edit = |a| UserAction::Edit(a);
    match id {
        GridActionId::Up => nav(NavAction::Up),
        GridActionId::Down => nav(NavAction::Down),
        GridActionId::Left => nav(NavAction::Left),
        GridActionId::Right => nav(NavAction::Right),
        GridActionId::PageUp => nav(NavAction::PageUp),
        GridActionId::PageDown => nav(NavAction::PageDown),
        GridActionId::NextTrack => nav(NavAction::NextTrack),
        GridActionId::PrevTrack => nav(NavAction::PrevTrack),
        GridActionId::FirstRow => nav(NavAction::FirstRow),
        GridActionId::LastRow => nav(NavAction::LastRow),
        GridActionId::TopLeft => nav(NavAction::TopLeft),
        GridActionId::BottomRight => nav(NavAction::BottomRight),
        GridActionId::ExpandRight => nav(NavAction::StepWidth(1)),
        GridActionId::ExpandLeft => nav(NavAction::StepWidth(-1)),
        GridActionId::ExpandDown => nav(NavAction::StepHeight(1)),
        GridActionId::ExpandUp => nav(NavAction::StepHeight(-1)),
        GridActionId::IncBrushWidth => nav(NavAction::IncBrushWidth),
        GridActionId::DecBrushWidth => nav(NavAction::DecBrushWidth),
        GridActionId::IncBrushHeight => nav(NavAction::IncBrushHeight),
        GridActionId::DecBrushHeight => nav(NavAction::DecBrushHeight),
        GridActionId::IncSelectionWidth => nav(NavAction::IncSelectionWidth),
        GridActionId::DecSelectionWidth => nav(NavAction::DecSelectionWidth),
        GridActionId::IncSelectionHeight => nav(NavAction::IncSelectionHeight),
        GridActionId::DecSelectionHeight => nav(NavAction::DecSelectionHeight),
        GridActionId::ZeroBlock => edit(EditAction::ZeroBlock),
        GridActionId::InsertBlock => edit(EditAction::InsertBlock),
        GridActionId::DeleteBlock => edit(EditAction::DeleteBlock),
        GridActionId::BackspaceBlock => edit(EditAction::BackspaceBlock),
        GridActionId::Cut => edit(EditAction::Cut),
        GridActionId::Copy => edit(EditAction::Copy),
        GridActionId::Paste => edit(EditAction::Paste),
        GridActionId::InsertTrack => edit(EditAction::InsertTrack),
        GridActionId::DeleteTrack => edit(EditAction::DeleteTrack),
    }
}

fn note_action(id: NoteActionId) -> UserAction {
    let note = |a| UserAction::Note(a);
    match id {
        NoteActionId::Up => UserAction::Nav(NavAction::Up),
        NoteActionId::Down => UserAction::Nav(NavAction::Down),
        NoteActionId::NextTrack => UserAction::Nav(NavAction::NextTrack),
        NoteActionId::PrevTrack => UserAction::Nav(NavAction::PrevTrack),
        NoteActionId::ClearNote => note(NoteAction::ClearNote),
        NoteActionId::RootUp => note(NoteAction::RootUp),
        NoteActionId::RootDown => note(NoteAction::RootDown),
        NoteActionId::OctaveUp => note(NoteAction::OctaveUp),
        NoteActionId::OctaveDown => note(NoteAction::OctaveDown),
        NoteActionId::NextScale => note(NoteAction::NextScale),
        NoteActionId::PrevScale => note(NoteAction::PrevScale),
        NoteActionId::NextMode => note(NoteAction::NextMode),
        NoteActionId::PrevMode => note(NoteAction::PrevMode),
        NoteActionId::ToggleChromatic => note(NoteAction::ToggleChromatic),
    }
}
