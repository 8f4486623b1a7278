//! Plain-text rendering of the pattern around the cursor and the status line.

use mtrak_core::state::{AppState, Mode};
use mtrak_types::{Event, DIGITS_PER_EVENT};

/// Status line: mode, position, brush, note context, timing, transport.
pub fn status_line(state: &AppState) -> String {
    let pattern = state.pattern();
    let brush = state.edit.brush.rect;
    let notes = &state.song.notes;
    let timing = &state.song.timing;
    let transport = if state.transport.is_playing {
        format!("> {:03}", state.transport.play_row)
    } else {
        format!("[] {:03}", state.transport.play_from_row)
    };
    let file = state
        .filename
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unnamed>".to_string());

    let mut line = format!(
        "{:<7} row {:03}/{:03} track {:02}/{:02} brush {}x{}",
        state.mode().name(),
        state.edit.row(),
        pattern.num_rows(),
        state.edit.track() + 1,
        pattern.num_tracks(),
        brush.w,
        brush.h,
    );
    if state.mode() == Mode::Select {
        let sel = state.edit.selection;
        line.push_str(&format!(" sel {}x{}", sel.w, sel.h));
    }
    line.push_str(&format!(
        "  {}{} mode {}  bpm {} lpb {} tpl {}  {}  {}",
        notes.root_name(),
        notes.scale_code(),
        notes.mode,
        timing.bpm,
        timing.lpb,
        timing.tpl,
        transport,
        file
    ));
    line
}

/// One page of rows centred on the cursor. The cursor row is marked `>`,
/// the playing row `*`; the digit under the cursor is bracketed.
pub fn grid(state: &AppState) -> Vec<String> {
    let pattern = state.pattern();
    let rows = pattern.num_rows();
    let page = state.page_rows.max(1).min(rows);
    let cursor = state.edit.row();
    let first = cursor.saturating_sub(page / 2).min(rows - page);

    (first..first + page)
        .map(|y| {
            let marker = if y == cursor {
                '>'
            } else if state.transport.is_playing && y == state.transport.play_row {
                '*'
            } else {
                ' '
            };
            let mut line = format!("{}{:03} ", marker, y);
            for (track, event) in pattern.row(y).iter().enumerate() {
                line.push(' ');
                let cursor_x = (y == cursor).then(|| state.edit.edit_pos.x as usize);
                push_event(&mut line, event, track, cursor_x);
            }
            line
        })
        .collect()
}

fn push_event(line: &mut String, event: &Event, track: usize, cursor_x: Option<usize>) {
    for i in 0..DIGITS_PER_EVENT {
        let digit = event.digit(i);
        let c = if event.is_empty() {
            '.'
        } else {
            std::char::from_digit(digit as u32, 16).unwrap_or('?')
        };
        if cursor_x == Some(track * DIGITS_PER_EVENT + i) {
            line.push('[');
            line.push(c);
            line.push(']');
        } else {
            line.push(c);
        }
    }
}
