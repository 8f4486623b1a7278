mod command;
mod edit;
mod navigation;
mod note;
mod session;

pub use command::execute_command;

use std::sync::Arc;
use std::time::Duration;

use mtrak_audio::PlaybackHandle;
use mtrak_types::{Action, Feedback, Op, Pattern, TrackResize};

use crate::action::{DispatchResult, EditAction, NavAction, UserAction};
use crate::error::CoreResult;
use crate::state::{AppState, Mode};

/// Edit-side driver: owns the state replica and the playback handle.
///
/// Every change to the song goes through [`Editor::submit`], which hands the
/// action to playback first and only then applies it locally, so both
/// replicas see the same sequence of ops.
pub struct Editor {
    pub state: AppState,
    handle: PlaybackHandle,
}

impl Editor {
    pub fn new(state: AppState, handle: PlaybackHandle) -> Self {
        Self { state, handle }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn handle(&self) -> &PlaybackHandle {
        &self.handle
    }

    /// Queue an action for playback and apply it to the local replica.
    /// A dropped action leaves the local replica untouched.
    pub fn submit(&mut self, action: Action) -> CoreResult<()> {
        let op = action.op.clone();
        if let Err(e) = self.handle.submit(action) {
            log::warn!(target: "pipeline", "{} dropped: {}", op.name(), e);
            return Err(e.into());
        }
        self.state.apply(&op);
        self.state.error = None;
        Ok(())
    }

    /// Submit `pattern` as the new edited pattern, undoable back to the
    /// current one.
    pub(crate) fn replace_pattern(&mut self, pattern: Pattern) -> CoreResult<()> {
        let index = self.state.edit.edit_pattern;
        let previous = Arc::clone(self.state.pattern());
        self.submit(Action::new(
            Op::ReplacePattern {
                index,
                pattern: Arc::new(pattern),
            },
            Some(Op::ReplacePattern {
                index,
                pattern: previous,
            }),
        ))
    }

    /// Resize the edited pattern to `tracks`, inserting or removing at
    /// track `at`. Undo resizes back at the same position.
    pub(crate) fn resize_tracks(&mut self, tracks: usize, at: usize) -> CoreResult<()> {
        let index = self.state.edit.edit_pattern;
        let previous = Arc::clone(self.state.pattern());
        let at = TrackResize::new(previous.num_tracks(), tracks.max(1), at).at;
        let pattern = previous.with_num_tracks(tracks, at);
        self.submit(Action::new(
            Op::ResizeTracks {
                index,
                pattern: Arc::new(pattern),
                at,
            },
            Some(Op::ResizeTracks {
                index,
                pattern: previous,
                at,
            }),
        ))
    }

    /// Edit a copy of the current pattern and submit it.
    pub(crate) fn edit_pattern(&mut self, f: impl FnOnce(&mut Pattern)) -> CoreResult<()> {
        let mut pattern = Pattern::clone(self.state.pattern());
        f(&mut pattern);
        self.replace_pattern(pattern)
    }

    /// Handle every playback report received so far. Returns the number
    /// handled.
    pub fn poll(&mut self) -> usize {
        let reports = self.handle.drain_feedback();
        let count = reports.len();
        for report in reports {
            self.handle_feedback(report);
        }
        count
    }

    /// Wait up to `timeout` for a report, then handle everything queued.
    pub fn poll_timeout(&mut self, timeout: Duration) -> usize {
        match self.handle.recv_feedback_timeout(timeout) {
            Some(report) => {
                self.handle_feedback(report);
                1 + self.poll()
            }
            None => 0,
        }
    }

    fn handle_feedback(&mut self, report: Feedback) {
        match report {
            Feedback::Applied(action) => self.state.record_applied(action),
            Feedback::Redraw { row } => self.state.transport.play_row = row,
            Feedback::TrackDefault {
                pattern,
                track,
                event,
            } => self.state.record_track_default(pattern, track, event),
            Feedback::Telemetry {
                avg_us,
                max_us,
                p95_us,
                overruns,
                lost_events,
            } => {
                log::debug!(
                    target: "pipeline",
                    "process: avg {}us, p95 {}us, max {}us, {} overruns, {} events lost",
                    avg_us,
                    p95_us,
                    max_us,
                    overruns,
                    lost_events
                );
                if lost_events > self.state.lost_events {
                    log::warn!(
                        target: "pipeline",
                        "{} MIDI events lost since last report",
                        lost_events - self.state.lost_events
                    );
                }
                self.state.lost_events = lost_events;
            }
        }
    }

    /// Revert the newest recorded action. No-op on an empty history.
    pub fn undo(&mut self) -> CoreResult<()> {
        let Some(action) = self.state.history.undo_action() else {
            return Ok(());
        };
        self.submit(action)?;
        self.state.history.commit_undo();
        Ok(())
    }

    /// Re-apply the newest reverted action. No-op on an empty history.
    pub fn redo(&mut self) -> CoreResult<()> {
        let Some(action) = self.state.history.redo_action() else {
            return Ok(());
        };
        self.submit(action)?;
        self.state.history.commit_redo();
        Ok(())
    }

    pub fn enter_mode(&mut self, mode: Mode) {
        self.state.modes.enter(mode);
    }

    /// Back to the previous mode, dropping the current error and any
    /// brush extent or selection.
    pub fn leave_mode(&mut self) {
        self.state.modes.leave();
        self.state.error = None;
        self.state.edit.collapse_brush();
    }
}

/// Dispatch a user action. Failures are logged and become the current
/// error; the returned result then carries no status.
pub fn dispatch_action(action: &UserAction, editor: &mut Editor) -> DispatchResult {
    if editor.state.mode() == Mode::Select && !keeps_selection(action) {
        editor.leave_mode();
    }

    let result = match action {
        UserAction::Nav(a) => navigation::dispatch_nav(*a, editor).map(|_| DispatchResult::none()),
        UserAction::Edit(a) => edit::dispatch_edit(*a, editor),
        UserAction::Note(a) => note::dispatch_note(*a, editor).map(|_| DispatchResult::none()),
        UserAction::Session(a) => session::dispatch_session(a, editor),
        UserAction::EnterMode(mode) => {
            editor.enter_mode(*mode);
            Ok(DispatchResult::none())
        }
        UserAction::LeaveMode => {
            editor.leave_mode();
            Ok(DispatchResult::none())
        }
        UserAction::Undo => editor.undo().map(|_| DispatchResult::none()),
        UserAction::Redo => editor.redo().map(|_| DispatchResult::none()),
        UserAction::Command(line) => execute_command(line, editor),
        UserAction::Quit => Ok(DispatchResult::with_quit()),
        UserAction::None => Ok(DispatchResult::none()),
    };

    match result {
        Ok(result) => result,
        Err(e) => {
            log::debug!(target: "command", "{:?} failed: {}", action, e);
            editor.state.error = Some(e.to_string());
            DispatchResult::none()
        }
    }
}

/// Actions that work on the selection while in select mode. Anything else
/// leaves select mode first.
fn keeps_selection(action: &UserAction) -> bool {
    matches!(
        action,
        UserAction::Nav(
            NavAction::IncSelectionWidth
                | NavAction::DecSelectionWidth
                | NavAction::IncSelectionHeight
                | NavAction::DecSelectionHeight
                | NavAction::NextTrack
                | NavAction::PrevTrack
        ) | UserAction::Edit(
            EditAction::ZeroBlock
                | EditAction::InsertBlock
                | EditAction::DeleteBlock
                | EditAction::BackspaceBlock
                | EditAction::Cut
                | EditAction::Copy
        ) | UserAction::Undo
            | UserAction::Redo
            | UserAction::LeaveMode
    )
}
