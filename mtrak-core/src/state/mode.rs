/// Input modes. Entering a mode remembers the one it replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Edit,
    Select,
    Note,
    Command,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Edit => "EDIT",
            Mode::Select => "SELECT",
            Mode::Note => "NOTE",
            Mode::Command => "COMMAND",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeStack {
    current: Mode,
    previous: Vec<Mode>,
}

impl ModeStack {
    pub fn current(&self) -> Mode {
        self.current
    }

    pub fn enter(&mut self, mode: Mode) {
        self.previous.push(self.current);
        self.current = mode;
    }

    /// Return to the mode before the last `enter`, or to `Edit`.
    pub fn leave(&mut self) -> Mode {
        self.current = self.previous.pop().unwrap_or_default();
        self.current
    }

    pub fn reset(&mut self) {
        self.current = Mode::Edit;
        self.previous.clear();
    }
}
