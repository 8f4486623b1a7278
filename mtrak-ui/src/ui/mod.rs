//! Key notation, keymaps and the layer stack that turns typed keys into
//! [`mtrak_core::action::UserAction`]s.

pub mod action_id;
pub mod keybindings;
pub mod keymap;
pub mod layer;

pub use action_id::ActionId;
pub use keymap::{KeyBinding, Keymap};
pub use layer::{Layer, LayerResult, LayerStack};

/// Named (non-character) keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Backspace,
    Tab,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
}

impl KeyCode {
    pub fn name(&self) -> &'static str {
        match self {
            KeyCode::Up => "Up",
            KeyCode::Down => "Down",
            KeyCode::Left => "Left",
            KeyCode::Right => "Right",
            KeyCode::Enter => "Enter",
            KeyCode::Escape => "Escape",
            KeyCode::Backspace => "Backspace",
            KeyCode::Tab => "Tab",
            KeyCode::Home => "Home",
            KeyCode::End => "End",
            KeyCode::PageUp => "PageUp",
            KeyCode::PageDown => "PageDown",
            KeyCode::Insert => "Insert",
            KeyCode::Delete => "Delete",
        }
    }
}

/// A key with its modifiers, as written in keybindings.toml and typed at
/// the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPattern {
    Char(char),
    Key(KeyCode),
    Ctrl(char),
    CtrlKey(KeyCode),
    ShiftKey(KeyCode),
    CtrlShiftKey(KeyCode),
}

impl KeyPattern {
    pub fn display(&self) -> String {
        match self {
            KeyPattern::Char(' ') => "Space".to_string(),
            KeyPattern::Char(c) => c.to_string(),
            KeyPattern::Key(k) => k.name().to_string(),
            KeyPattern::Ctrl(c) => format!("Ctrl+{}", c),
            KeyPattern::CtrlKey(k) => format!("Ctrl+{}", k.name()),
            KeyPattern::ShiftKey(k) => format!("Shift+{}", k.name()),
            KeyPattern::CtrlShiftKey(k) => format!("Ctrl+Shift+{}", k.name()),
        }
    }
}
