use mtrak_types::{Action, Event, NoteContext, Op, DIGITS_PER_EVENT};

use crate::action::NoteAction;
use crate::error::CoreResult;

use super::Editor;

const DEFAULT_STATUS: u8 = 0x90;
const DEFAULT_VELOCITY: u8 = 0x70;

pub(super) fn dispatch_note(action: NoteAction, editor: &mut Editor) -> CoreResult<()> {
    let notes = editor.state.song.notes;
    match action {
        NoteAction::Degree(degree) => enter_note(editor, notes.degree_to_note(degree)),
        NoteAction::Note(note) => enter_note(editor, note.min(127)),
        NoteAction::ClearNote => set_note_byte(editor, 0),
        NoteAction::RootUp if notes.root < 127 => set_notes(editor, NoteContext { root: notes.root + 1, ..notes }),
        NoteAction::RootDown if notes.root > 0 => set_notes(editor, NoteContext { root: notes.root - 1, ..notes }),
        NoteAction::OctaveUp if notes.root <= 127 - 12 => {
            set_notes(editor, NoteContext { root: notes.root + 12, ..notes })
        }
        NoteAction::OctaveDown if notes.root >= 12 => {
            set_notes(editor, NoteContext { root: notes.root - 12, ..notes })
        }
        NoteAction::RootUp | NoteAction::RootDown | NoteAction::OctaveUp | NoteAction::OctaveDown => Ok(()),
        NoteAction::NextScale | NoteAction::PrevScale => {
            let scale = if action == NoteAction::NextScale {
                notes.scale.next()
            } else {
                notes.scale.prev()
            };
            // keep the mode inside the new scale
            let mode = notes.mode % scale.len();
            set_notes(editor, NoteContext { scale, mode, ..notes })
        }
        NoteAction::NextMode => {
            let mode = (notes.mode + 1) % notes.scale.len();
            set_notes(editor, NoteContext { mode, ..notes })
        }
        NoteAction::PrevMode => {
            let len = notes.scale.len();
            let mode = (notes.mode + len - 1) % len;
            set_notes(editor, NoteContext { mode, ..notes })
        }
        NoteAction::ToggleChromatic => set_notes(
            editor,
            NoteContext {
                chromatic: !notes.chromatic,
                ..notes
            },
        ),
    }
}

fn set_notes(editor: &mut Editor, notes: NoteContext) -> CoreResult<()> {
    editor.submit(Action::new(Op::SetNoteContext(notes), None))
}

/// Write `note` into data1 of the cursor's track and audition it.
fn enter_note(editor: &mut Editor, note: u8) -> CoreResult<()> {
    set_note_byte(editor, note)?;
    let event = preview_event(editor, note);
    if let Err(e) = editor.handle().preview(event) {
        log::debug!(target: "pipeline", "preview dropped: {}", e);
    }
    Ok(())
}

fn set_note_byte(editor: &mut Editor, note: u8) -> CoreResult<()> {
    let x = editor.state.edit.track() * DIGITS_PER_EVENT + 2;
    let y = editor.state.edit.row();
    editor.edit_pattern(|p| {
        p.set_digit(x, y, note >> 4);
        p.set_digit(x + 1, y, note & 0x0f);
    })
}

/// Note-on for `note` on the cursor's track. The scan stops at the nearest
/// row at or above the cursor that sets a status or a velocity; whatever
/// that row leaves unset comes from the track default.
fn preview_event(editor: &Editor, note: u8) -> Event {
    let state = &editor.state;
    let pattern = state.pattern();
    let track = state.edit.track();
    let mut status = 0u8;
    let mut velocity = 0u8;
    for y in (0..=state.edit.row()).rev() {
        let event = pattern.event(track, y);
        if status == 0 && event.status() != 0 {
            status = DEFAULT_STATUS | event.channel();
        }
        if velocity == 0 && event.data2() != 0 {
            velocity = event.data2();
        }
        if status != 0 || velocity != 0 {
            break;
        }
    }
    let defaults = state.track_default(state.edit.edit_pattern, track);
    if status == 0 && defaults.status() != 0 {
        status = DEFAULT_STATUS | defaults.channel();
    }
    if velocity == 0 {
        velocity = defaults.data2();
    }
    if status == 0 {
        status = DEFAULT_STATUS;
    }
    if velocity == 0 {
        velocity = DEFAULT_VELOCITY;
    }
    Event::new(status, note, velocity)
}
