//! Typed commands: `bpm 140`, `rows 32`, `w song.json`...

use std::path::Path;

use mtrak_types::Timing;

use crate::action::DispatchResult;
use crate::error::{CoreError, CoreResult};

use super::{edit, session, Editor};

/// Run one command line. An empty line does nothing.
pub fn execute_command(line: &str, editor: &mut Editor) -> CoreResult<DispatchResult> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(DispatchResult::none());
    };
    let arg = words.next();
    log::debug!(target: "command", "{}", line.trim());

    match name {
        "r" | "read" => session::load(editor, arg.map(Path::new)),
        "w" | "write" => session::save(editor, arg.map(Path::new)),
        "bpm" => {
            let bpm = timing_value("bpm", arg)?;
            let timing = Timing {
                bpm,
                ..editor.state.song.timing
            };
            session::set_timing(editor, timing).map(|_| DispatchResult::none())
        }
        "lpb" => {
            let lpb = timing_value("lpb", arg)?;
            let timing = Timing {
                lpb,
                ..editor.state.song.timing
            };
            session::set_timing(editor, timing).map(|_| DispatchResult::none())
        }
        "tpl" => {
            let tpl = timing_value("tpl", arg)?;
            let timing = Timing {
                tpl,
                ..editor.state.song.timing
            };
            session::set_timing(editor, timing).map(|_| DispatchResult::none())
        }
        "rows" => {
            let rows = number("rows", arg)?;
            edit::set_rows(editor, rows).map(|_| DispatchResult::none())
        }
        "tracks" => {
            let tracks = number("tracks", arg)?;
            edit::set_tracks(editor, tracks).map(|_| DispatchResult::none())
        }
        other => Err(CoreError::UnknownCommand(other.to_string())),
    }
}

fn number(what: &'static str, arg: Option<&str>) -> CoreResult<i64> {
    let arg = arg.ok_or(CoreError::MissingArgument(what))?;
    Ok(arg.parse::<i64>()?)
}

/// A positive timing value.
fn timing_value(what: &'static str, arg: Option<&str>) -> CoreResult<u32> {
    let value = number(what, arg)?;
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(CoreError::InvalidValue { what, value })
}
