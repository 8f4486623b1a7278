use std::path::{Path, PathBuf};
use std::sync::Arc;

use mtrak_types::{Action, Op, Timing};

use crate::action::{DispatchResult, SessionAction};
use crate::error::{CoreError, CoreResult};
use crate::state::persistence::{load_song, save_song};

use super::Editor;

pub(super) fn dispatch_session(
    action: &SessionAction,
    editor: &mut Editor,
) -> CoreResult<DispatchResult> {
    match action {
        SessionAction::Play => play(editor)?,
        SessionAction::Stop => stop(editor)?,
        SessionAction::PlayOrStop => {
            if editor.state.transport.is_playing {
                stop(editor)?;
            } else {
                play(editor)?;
            }
        }
        SessionAction::SetPlayFromRow => {
            editor.state.transport.play_from_row = editor.state.edit.row();
        }
        SessionAction::Load(path) => return load(editor, path.as_deref()),
        SessionAction::Save(path) => return save(editor, path.as_deref()),
    }
    Ok(DispatchResult::none())
}

/// Start playback from the play-from row.
fn play(editor: &mut Editor) -> CoreResult<()> {
    let from_row = editor.state.transport.play_from_row;
    editor.submit(Action::new(Op::Play { from_row }, None))
}

fn stop(editor: &mut Editor) -> CoreResult<()> {
    editor.submit(Action::new(Op::Stop, None))
}

/// The file to use: `path` when given (it becomes the current filename),
/// otherwise the current filename.
fn resolve_filename(editor: &mut Editor, path: Option<&Path>) -> CoreResult<PathBuf> {
    if let Some(path) = path {
        editor.state.filename = Some(path.to_path_buf());
    }
    editor.state.filename.clone().ok_or(CoreError::NoFilename)
}

/// Replace the song with the one in the file. The load itself is not
/// undoable and resets editing state.
pub(super) fn load(editor: &mut Editor, path: Option<&Path>) -> CoreResult<DispatchResult> {
    let path = resolve_filename(editor, path)?;
    let song = load_song(&path)?;
    let previous = Arc::new(editor.state.song.clone());
    editor.submit(Action::new(
        Op::LoadSong {
            song: Arc::new(song),
            previous,
        },
        None,
    ))?;
    Ok(DispatchResult::with_status(format!("read {}", path.display())))
}

pub(super) fn save(editor: &mut Editor, path: Option<&Path>) -> CoreResult<DispatchResult> {
    let path = resolve_filename(editor, path)?;
    save_song(&editor.state.song_for_save(), &path)?;
    Ok(DispatchResult::with_status(format!("wrote {}", path.display())))
}

/// Submit new timing, undoable back to the current one.
pub(super) fn set_timing(editor: &mut Editor, timing: Timing) -> CoreResult<()> {
    let current = editor.state.song.timing;
    if timing == current {
        return Ok(());
    }
    editor.submit(Action::new(
        Op::SetTiming(timing),
        Some(Op::SetTiming(current)),
    ))
}
