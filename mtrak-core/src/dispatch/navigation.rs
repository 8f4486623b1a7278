use crate::action::NavAction;
use crate::error::CoreResult;
use crate::state::Mode;

use super::Editor;

pub(super) fn dispatch_nav(action: NavAction, editor: &mut Editor) -> CoreResult<()> {
    let bounds = editor.state.bounds();
    let lpb = editor.state.song.timing.lpb;
    let page = editor.state.page_rows as i32;

    if editor.state.mode() == Mode::Select
        && matches!(action, NavAction::NextTrack | NavAction::PrevTrack)
    {
        // the cursor row follows the selection top before the track moves
        let top = editor.state.edit.selection.y;
        editor.state.edit.edit_pos.y = top;
        editor.leave_mode();
    }

    let edit = &mut editor.state.edit;
    match action {
        NavAction::Up => edit.up(bounds),
        NavAction::Down => edit.down(bounds),
        NavAction::Left => edit.left(bounds),
        NavAction::Right => edit.right(bounds),
        NavAction::PageUp => edit.page_up(page, bounds),
        NavAction::PageDown => edit.page_down(page, bounds),
        NavAction::NextTrack => edit.next_track(bounds),
        NavAction::PrevTrack => edit.prev_track(bounds),
        NavAction::FirstRow => edit.jump_first_row(bounds),
        NavAction::LastRow => edit.jump_last_row(bounds),
        NavAction::TopLeft => edit.jump_top_left(bounds),
        NavAction::BottomRight => edit.jump_bottom_right(bounds),
        NavAction::StepWidth(dir) => edit.step_width(dir, bounds),
        NavAction::StepHeight(dir) => edit.step_height(dir, lpb, bounds),
        NavAction::IncBrushWidth => edit.inc_brush_width(bounds),
        NavAction::DecBrushWidth => edit.dec_brush_width(bounds),
        NavAction::IncBrushHeight => edit.inc_brush_height(lpb, bounds),
        NavAction::DecBrushHeight => edit.dec_brush_height(lpb, bounds),
        NavAction::IncSelectionWidth | NavAction::DecSelectionWidth => {
            enter_select(editor, false);
            let edit = &mut editor.state.edit;
            if action == NavAction::IncSelectionWidth {
                edit.inc_selection_width(bounds);
            } else {
                edit.dec_selection_width(bounds);
            }
        }
        NavAction::IncSelectionHeight | NavAction::DecSelectionHeight => {
            enter_select(editor, true);
            let edit = &mut editor.state.edit;
            if action == NavAction::IncSelectionHeight {
                edit.inc_selection_height(bounds);
            } else {
                edit.dec_selection_height(bounds);
            }
        }
        NavAction::CollapseBrush => edit.collapse_brush(),
    }
    Ok(())
}

/// Enter select mode unless already there. Growing the selection over rows
/// starts from whole tracks.
fn enter_select(editor: &mut Editor, whole_tracks: bool) {
    if editor.state.mode() == Mode::Select {
        return;
    }
    if whole_tracks {
        let bounds = editor.state.bounds();
        let edit = &mut editor.state.edit;
        edit.brush.rect = edit.block_target(mtrak_types::DIGITS_PER_EVENT as i32, bounds);
        edit.collapse_selection();
    }
    editor.enter_mode(Mode::Select);
}
