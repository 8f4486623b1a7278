use mtrak_types::{Pattern, Rect, Size, DIGITS_PER_EVENT, MAX_TRACKS};

use crate::action::{DispatchResult, EditAction};
use crate::error::{CoreError, CoreResult};
use crate::state::Mode;

use super::Editor;

const TRACK: i32 = DIGITS_PER_EVENT as i32;

pub(super) fn dispatch_edit(action: EditAction, editor: &mut Editor) -> CoreResult<DispatchResult> {
    match action {
        EditAction::InsertDigit(value) => insert_digit(editor, value)?,
        EditAction::ZeroBlock => {
            let r = target(editor, 2);
            editor.edit_pattern(|p| p.zero_block(r))?;
        }
        EditAction::InsertBlock => {
            let r = target(editor, TRACK);
            editor.edit_pattern(|p| insert_block(p, r))?;
        }
        EditAction::DeleteBlock => {
            let r = target(editor, TRACK);
            editor.edit_pattern(|p| delete_block(p, r))?;
        }
        EditAction::BackspaceBlock => backspace_block(editor)?,
        EditAction::Cut => {
            let r = target(editor, TRACK);
            let block = editor.state.pattern().block(r);
            editor.edit_pattern(|p| p.zero_block(r))?;
            editor.state.clipboard.set(block);
        }
        EditAction::Copy => {
            let r = target(editor, TRACK);
            let block = editor.state.pattern().block(r);
            editor.state.clipboard.set(block);
            return Ok(DispatchResult::with_status("copied"));
        }
        EditAction::Paste => paste(editor)?,
        EditAction::InsertTrack => insert_track(editor)?,
        EditAction::DeleteTrack => delete_track(editor)?,
    }
    Ok(DispatchResult::none())
}

/// Region a block operation works on: the selection in select mode,
/// otherwise the brush widened to `min_width`-aligned columns.
fn target(editor: &Editor, min_width: i32) -> Rect {
    let edit = &editor.state.edit;
    if editor.state.mode() == Mode::Select {
        edit.selection
    } else {
        edit.block_target(min_width, editor.state.bounds())
    }
}

/// Set the digit under the cursor and step right.
pub(super) fn insert_digit(editor: &mut Editor, value: u8) -> CoreResult<()> {
    if value > 0xf {
        return Err(CoreError::InvalidValue {
            what: "digit",
            value: value as i64,
        });
    }
    let pos = editor.state.edit.edit_pos;
    editor.edit_pattern(|p| p.set_digit(pos.x as usize, pos.y as usize, value))?;
    let bounds = editor.state.bounds();
    editor.state.edit.right(bounds);
    Ok(())
}

/// Shift the content from the top of `r` down by its height within its
/// columns; `r` is left zeroed.
fn insert_block(p: &mut Pattern, r: Rect) {
    let rows = p.num_rows() as i32;
    let below = rows - r.bottom();
    if below > 0 {
        p.copy_block(Rect::new(r.x, r.y, r.w, below), 0, r.h);
    }
    p.zero_block(clip_rows(r, rows));
}

/// Remove `r`, shifting the content below it up and zeroing the vacated
/// bottom rows.
fn delete_block(p: &mut Pattern, r: Rect) {
    let rows = p.num_rows() as i32;
    let below = rows - r.bottom();
    if below > 0 {
        p.copy_block(Rect::new(r.x, r.bottom(), r.w, below), 0, -r.h);
        p.zero_block(Rect::new(r.x, rows - r.h, r.w, r.h));
    } else {
        p.zero_block(clip_rows(r, rows));
    }
}

/// Delete the block of the same height above the target and move up.
fn backspace_block(editor: &mut Editor) -> CoreResult<()> {
    let r = target(editor, TRACK);
    let top = (r.y - r.h).max(0);
    let h = r.y - top;
    if h == 0 {
        return Ok(());
    }
    let above = Rect::new(r.x, top, r.w, h);
    editor.edit_pattern(|p| delete_block(p, above))?;
    let bounds = editor.state.bounds();
    editor.state.edit.move_brush(0, -h, bounds);
    Ok(())
}

/// Write the clipboard at the brush, clipped at the pattern edge. Whole-track
/// blocks land on a track boundary.
fn paste(editor: &mut Editor) -> CoreResult<()> {
    let Some(block) = editor.state.clipboard.get().cloned() else {
        return Ok(());
    };
    let bounds = editor.state.bounds();
    let origin = editor.state.edit.brush.rect.origin();
    let x = if block.width() % DIGITS_PER_EVENT == 0 {
        origin.x - origin.x % TRACK
    } else {
        origin.x
    };
    let r = clip(
        Rect::new(x, origin.y, block.width() as i32, block.height() as i32),
        bounds,
    );
    if r.is_empty() {
        return Ok(());
    }
    editor.edit_pattern(|p| p.set_block(r, &block))
}

fn insert_track(editor: &mut Editor) -> CoreResult<()> {
    let tracks = editor.state.pattern().num_tracks();
    if tracks >= MAX_TRACKS {
        return Err(CoreError::InvalidValue {
            what: "track count",
            value: tracks as i64 + 1,
        });
    }
    let at = editor.state.edit.track();
    editor.resize_tracks(tracks + 1, at)
}

/// Remove the track under the cursor. The last remaining track stays.
fn delete_track(editor: &mut Editor) -> CoreResult<()> {
    let tracks = editor.state.pattern().num_tracks();
    if tracks <= 1 {
        return Ok(());
    }
    let at = editor.state.edit.track();
    editor.resize_tracks(tracks - 1, at)
}

/// Resize the edited pattern to `rows`, adding or removing rows at the end.
pub(super) fn set_rows(editor: &mut Editor, rows: i64) -> CoreResult<()> {
    if rows < 1 || rows > mtrak_types::MAX_ROWS as i64 {
        return Err(CoreError::InvalidValue {
            what: "row count",
            value: rows,
        });
    }
    let rows = rows as usize;
    let current = editor.state.pattern().num_rows();
    if rows == current {
        return Ok(());
    }
    let pattern = editor.state.pattern().with_num_rows(rows, rows.min(current));
    editor.replace_pattern(pattern)
}

/// Resize the edited pattern to `tracks`, adding or removing tracks at the
/// end.
pub(super) fn set_tracks(editor: &mut Editor, tracks: i64) -> CoreResult<()> {
    if tracks < 1 || tracks > MAX_TRACKS as i64 {
        return Err(CoreError::InvalidValue {
            what: "track count",
            value: tracks,
        });
    }
    let tracks = tracks as usize;
    let current = editor.state.pattern().num_tracks();
    if tracks == current {
        return Ok(());
    }
    editor.resize_tracks(tracks, tracks.min(current))
}

fn clip_rows(r: Rect, rows: i32) -> Rect {
    Rect::new(r.x, r.y, r.w, r.h.min(rows - r.y).max(0))
}

fn clip(r: Rect, bounds: Size) -> Rect {
    Rect::new(
        r.x,
        r.y,
        r.w.min(bounds.w - r.x).max(0),
        r.h.min(bounds.h - r.y).max(0),
    )
}

#[cfg(test)]
mod tests {
    use crate::action::{EditAction, NavAction, UserAction};
    use crate::dispatch::testing::Rig;
    use crate::state::Mode;
    use mtrak_types::{Event, Pattern};

    fn editor() -> Rig {
        Rig::new(Pattern::new(8, 2))
    }

    fn edit(ed: &mut Rig, action: EditAction) {
        ed.dispatch(UserAction::Edit(action));
    }

    fn nav(ed: &mut Rig, action: NavAction) {
        ed.dispatch(UserAction::Nav(action));
    }

    fn type_event(ed: &mut Rig, digits: [u8; 6]) {
        for d in digits {
            edit(ed, EditAction::InsertDigit(d));
        }
    }

    #[test]
    fn insert_digit_writes_and_steps_right() {
        let mut ed = editor();
        type_event(&mut ed, [9, 0, 3, 12, 4, 0]);
        assert_eq!(ed.state.pattern().event(0, 0), Event::new(0x90, 0x3c, 0x40));
        assert_eq!(ed.state.edit.edit_pos.x, 6);
        assert!(ed.state.error.is_none());
    }

    #[test]
    fn digit_out_of_range_is_an_error() {
        let mut ed = editor();
        edit(&mut ed, EditAction::InsertDigit(16));
        assert!(ed.state.error.is_some());
        assert_eq!(ed.state.edit.edit_pos.x, 0);
    }

    #[test]
    fn insert_and_delete_block_shift_rows() {
        let mut ed = editor();
        type_event(&mut ed, [9, 0, 3, 12, 4, 0]);
        nav(&mut ed, NavAction::TopLeft);

        edit(&mut ed, EditAction::InsertBlock);
        let p = ed.state.pattern();
        assert_eq!(p.event(0, 0), Event::EMPTY);
        assert_eq!(p.event(0, 1), Event::new(0x90, 0x3c, 0x40));

        edit(&mut ed, EditAction::DeleteBlock);
        let p = ed.state.pattern();
        assert_eq!(p.event(0, 0), Event::new(0x90, 0x3c, 0x40));
        assert_eq!(p.event(0, 1), Event::EMPTY);
        assert_eq!(p.event(0, 7), Event::EMPTY);
    }

    #[test]
    fn backspace_removes_row_above_and_moves_up() {
        let mut ed = editor();
        nav(&mut ed, NavAction::Down);
        nav(&mut ed, NavAction::Down);
        type_event(&mut ed, [9, 0, 3, 12, 4, 0]);
        nav(&mut ed, NavAction::TopLeft);
        nav(&mut ed, NavAction::Down);
        nav(&mut ed, NavAction::Down);
        edit(&mut ed, EditAction::BackspaceBlock);
        assert_eq!(ed.state.edit.edit_pos.y, 1);
        assert_eq!(ed.state.pattern().event(0, 1), Event::new(0x90, 0x3c, 0x40));
        assert_eq!(ed.state.pattern().event(0, 2), Event::EMPTY);
    }

    #[test]
    fn backspace_on_first_row_does_nothing() {
        let mut ed = editor();
        let before = ed.state.pattern().clone();
        edit(&mut ed, EditAction::BackspaceBlock);
        assert_eq!(ed.state.pattern(), &before);
    }

    #[test]
    fn zero_block_clears_a_byte() {
        let mut ed = editor();
        type_event(&mut ed, [9, 0, 3, 12, 4, 0]);
        nav(&mut ed, NavAction::TopLeft);
        nav(&mut ed, NavAction::Right);
        nav(&mut ed, NavAction::Right);
        nav(&mut ed, NavAction::Right);
        edit(&mut ed, EditAction::ZeroBlock);
        assert_eq!(ed.state.pattern().event(0, 0), Event::new(0x90, 0x00, 0x40));
    }

    #[test]
    fn cut_then_paste_moves_a_track_cell() {
        let mut ed = editor();
        type_event(&mut ed, [9, 0, 3, 12, 4, 0]);
        nav(&mut ed, NavAction::TopLeft);
        edit(&mut ed, EditAction::Cut);
        assert_eq!(ed.state.pattern().event(0, 0), Event::EMPTY);
        assert!(!ed.state.clipboard.is_empty());

        nav(&mut ed, NavAction::NextTrack);
        nav(&mut ed, NavAction::Right);
        nav(&mut ed, NavAction::Down);
        edit(&mut ed, EditAction::Paste);
        assert_eq!(ed.state.pattern().event(1, 1), Event::new(0x90, 0x3c, 0x40));
    }

    #[test]
    fn paste_is_clipped_at_the_edge() {
        let mut ed = editor();
        nav(&mut ed, NavAction::IncSelectionWidth);
        nav(&mut ed, NavAction::IncSelectionWidth);
        nav(&mut ed, NavAction::IncSelectionHeight);
        assert_eq!(ed.state.mode(), Mode::Select);
        edit(&mut ed, EditAction::Copy);
        ed.dispatch(UserAction::LeaveMode);
        nav(&mut ed, NavAction::BottomRight);
        edit(&mut ed, EditAction::Paste);
        assert!(ed.state.error.is_none());
        assert_eq!(ed.state.pattern().num_rows(), 8);
    }

    #[test]
    fn tracks_insert_and_delete_at_cursor() {
        let mut ed = editor();
        type_event(&mut ed, [9, 0, 3, 12, 4, 0]);
        nav(&mut ed, NavAction::TopLeft);
        edit(&mut ed, EditAction::InsertTrack);
        let p = ed.state.pattern();
        assert_eq!(p.num_tracks(), 3);
        assert_eq!(p.event(0, 0), Event::EMPTY);
        assert_eq!(p.event(1, 0), Event::new(0x90, 0x3c, 0x40));

        edit(&mut ed, EditAction::DeleteTrack);
        edit(&mut ed, EditAction::DeleteTrack);
        edit(&mut ed, EditAction::DeleteTrack);
        assert_eq!(ed.state.pattern().num_tracks(), 1);
    }
}
