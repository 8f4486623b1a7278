//! Line-oriented front end.
//!
//! Each input line is a list of whitespace-separated keys in keybindings.toml
//! notation (`Down Down 903c40 Ctrl+c`). In edit and select modes a run of
//! hex digits types those digits; in note mode the note keys enter notes. A
//! line starting with `:` is a command, and `?` lists the active bindings.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use mtrak_core::action::{DispatchResult, EditAction, NoteAction, UserAction};
use mtrak_core::dispatch::{dispatch_action, Editor};
use mtrak_core::state::Mode;

use crate::ui::keybindings::{parse_key, Keybindings, NoteKeys};
use crate::ui::{LayerResult, LayerStack};
use crate::view;

/// Time given to playback to report back before the screen is redrawn.
const SETTLE: Duration = Duration::from_millis(20);

pub struct Console {
    editor: Editor,
    layers: LayerStack,
    note_keys: NoteKeys,
}

/// What one input line produced.
#[derive(Debug, Default)]
pub struct LineOutcome {
    pub quit: bool,
    pub output: Vec<String>,
}

impl Console {
    pub fn new(editor: Editor, keybindings: Keybindings) -> Self {
        let mut layers = LayerStack::new(keybindings.layers);
        layers.set_mode(editor.state.mode());
        Self {
            editor,
            layers,
            note_keys: keybindings.note_keys,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    /// Dispatch one action and keep the active layers in step with the mode.
    pub fn dispatch(&mut self, action: &UserAction) -> DispatchResult {
        let result = dispatch_action(action, &mut self.editor);
        self.layers.set_mode(self.editor.state.mode());
        result
    }

    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        let mut outcome = LineOutcome::default();
        let trimmed = line.trim();

        if self.editor.state.mode() == Mode::Command {
            self.run_command(trimmed, &mut outcome);
        } else if let Some(command) = trimmed.strip_prefix(':') {
            self.run_command(command, &mut outcome);
        } else if trimmed == "?" {
            outcome.output.extend(
                self.layers
                    .collect_bindings()
                    .into_iter()
                    .map(|(key, description)| format!("{:<18} {}", key, description)),
            );
        } else {
            let mut tokens = trimmed.split_whitespace();
            while let Some(token) = tokens.next() {
                let Some(actions) = self.decode(token) else {
                    log::debug!(target: "ui::console", "unknown key '{}'", token);
                    outcome.output.push(format!("unknown key: {}", token));
                    break;
                };
                for action in actions {
                    self.apply(&action, &mut outcome);
                    if outcome.quit {
                        return outcome;
                    }
                }
                // `: bpm 140` on one line
                if self.editor.state.mode() == Mode::Command {
                    let rest: Vec<&str> = tokens.by_ref().collect();
                    if !rest.is_empty() {
                        self.run_command(&rest.join(" "), &mut outcome);
                    }
                }
            }
        }

        if let Some(error) = &self.editor.state.error {
            outcome.output.push(format!("error: {}", error));
        }
        outcome
    }

    /// Run a command line, leaving command mode if it was active.
    fn run_command(&mut self, command: &str, outcome: &mut LineOutcome) {
        if self.editor.state.mode() == Mode::Command {
            self.dispatch(&UserAction::LeaveMode);
        }
        self.apply(&UserAction::Command(command.trim().to_string()), outcome);
    }

    fn apply(&mut self, action: &UserAction, outcome: &mut LineOutcome) {
        let result = self.dispatch(action);
        outcome.quit |= result.quit;
        outcome.output.extend(result.status);
    }

    /// The actions one typed token stands for.
    fn decode(&self, token: &str) -> Option<Vec<UserAction>> {
        let mode = self.editor.state.mode();
        if mode == Mode::Note {
            let mut chars = token.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if let Some(degree) = self.note_keys.degree(c, &self.editor.state.song.notes) {
                    return Some(vec![UserAction::Note(NoteAction::Degree(degree))]);
                }
            }
        }
        if let Some(key) = parse_key(token) {
            if let LayerResult::Action(id) = self.layers.resolve(&key) {
                log::debug!(target: "ui::console", "{} -> {}", token, id.as_str());
                return Some(vec![id.to_user_action()]);
            }
        }
        if matches!(mode, Mode::Edit | Mode::Select) {
            return hex_digits(token);
        }
        None
    }

    /// Give playback a moment to report, then take in everything it sent.
    pub fn settle(&mut self) {
        self.editor.poll_timeout(SETTLE);
        self.editor.poll();
    }

    pub fn render(&self) -> Vec<String> {
        let mut lines = view::grid(&self.editor.state);
        lines.push(view::status_line(&self.editor.state));
        lines
    }
}

fn hex_digits(token: &str) -> Option<Vec<UserAction>> {
    token
        .chars()
        .map(|c| {
            c.to_digit(16)
                .map(|d| UserAction::Edit(EditAction::InsertDigit(d as u8)))
        })
        .collect()
}

/// Read lines from stdin until EOF or quit.
pub fn run(console: &mut Console) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print_screen(&mut stdout, &console.render(), &[])?;
    prompt(&mut stdout, console)?;

    for line in stdin.lock().lines() {
        let line = line?;
        let outcome = console.handle_line(&line);
        if outcome.quit {
            log::info!(target: "ui::console", "quit");
            break;
        }
        console.settle();
        print_screen(&mut stdout, &console.render(), &outcome.output)?;
        prompt(&mut stdout, console)?;
    }
    Ok(())
}

fn print_screen(out: &mut impl Write, screen: &[String], messages: &[String]) -> io::Result<()> {
    for line in screen.iter().chain(messages) {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}

fn prompt(out: &mut impl Write, console: &Console) -> io::Result<()> {
    let prompt = if console.editor().state.mode() == Mode::Command {
        ":"
    } else {
        "> "
    };
    write!(out, "{}", prompt)?;
    out.flush()
}
