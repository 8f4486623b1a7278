use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use mtrak_types::NoteContext;

use super::action_id::parse_action_id;
use super::keymap::{KeyBinding, Keymap};
use super::layer::Layer;
use super::{KeyCode, KeyPattern};

/// Raw TOML structure for the keybindings config file
#[derive(Deserialize)]
struct KeybindingConfig {
    #[allow(dead_code)]
    version: u32,
    layers: HashMap<String, LayerConfig>,
    #[serde(default)]
    note_keys: NoteKeysConfig,
}

#[derive(Deserialize)]
struct LayerConfig {
    #[serde(default = "default_transparent")]
    transparent: bool,
    bindings: Vec<RawBinding>,
}

fn default_transparent() -> bool {
    true
}

/// A single binding entry from TOML
#[derive(Deserialize)]
struct RawBinding {
    key: String,
    action: String,
    description: String,
}

#[derive(Deserialize, Default)]
struct NoteKeysConfig {
    scale: Option<HashMap<String, usize>>,
    chromatic: Option<HashMap<String, usize>>,
}

/// Keys that enter notes in note mode.
#[derive(Debug, Clone, Default)]
pub struct NoteKeys {
    scale: HashMap<char, usize>,
    chromatic: HashMap<char, usize>,
}

impl NoteKeys {
    /// The degree `key` enters under `notes`. In scale mode key values from
    /// 12 up continue an octave above the lower row, whatever the scale
    /// length.
    pub fn degree(&self, key: char, notes: &NoteContext) -> Option<usize> {
        if notes.chromatic {
            self.chromatic.get(&key).copied()
        } else {
            let value = *self.scale.get(&key)?;
            Some(if value >= 12 {
                value - 12 + notes.scale.len()
            } else {
                value
            })
        }
    }
}

/// Everything keybindings.toml describes.
pub struct Keybindings {
    pub layers: Vec<Layer>,
    pub note_keys: NoteKeys,
}

/// Intern a String into a &'static str.
/// These are loaded once at startup and never freed.
fn intern(s: String) -> &'static str {
    Box::leak(s.into_boxed_str())
}

/// Parse a key notation string into a KeyPattern.
///
/// Supported formats:
/// - `"q"` → Char('q')
/// - `"Up"` → Key(KeyCode::Up)
/// - `"Ctrl+s"` → Ctrl('s')
/// - `"Ctrl+Left"` → CtrlKey(KeyCode::Left)
/// - `"Shift+Right"` → ShiftKey(KeyCode::Right)
/// - `"Ctrl+Shift+Right"` → CtrlShiftKey(KeyCode::Right)
///
/// Named keys are matched without regard to case, so `up` works at the
/// prompt. Returns `None` for anything else.
pub fn parse_key(s: &str) -> Option<KeyPattern> {
    if let Some(rest) = strip_prefix_ci(s, "Ctrl+Shift+") {
        parse_named_key(rest).map(KeyPattern::CtrlShiftKey)
    } else if let Some(rest) = strip_prefix_ci(s, "Ctrl+") {
        match single_char(rest) {
            Some(c) => Some(KeyPattern::Ctrl(c.to_ascii_lowercase())),
            None => parse_named_key(rest).map(KeyPattern::CtrlKey),
        }
    } else if let Some(rest) = strip_prefix_ci(s, "Shift+") {
        parse_named_key(rest).map(KeyPattern::ShiftKey)
    } else if let Some(c) = single_char(s) {
        Some(KeyPattern::Char(c))
    } else if s.eq_ignore_ascii_case("Space") {
        Some(KeyPattern::Char(' '))
    } else {
        parse_named_key(s).map(KeyPattern::Key)
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

/// Parse a named key string (e.g., "Up", "PageDown") into a KeyCode.
fn parse_named_key(s: &str) -> Option<KeyCode> {
    let key = match s.to_ascii_lowercase().as_str() {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "enter" => KeyCode::Enter,
        "escape" | "esc" => KeyCode::Escape,
        "backspace" => KeyCode::Backspace,
        "tab" => KeyCode::Tab,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdown" => KeyCode::PageDown,
        "insert" | "ins" => KeyCode::Insert,
        "delete" | "del" => KeyCode::Delete,
        _ => return None,
    };
    Some(key)
}

/// Embedded default keybindings TOML
const DEFAULT_KEYBINDINGS: &str = include_str!("../../keybindings.toml");

/// Load keybindings: embedded default, optionally merged with the user
/// override in `<config_dir>/mtrak/keybindings.toml`.
pub fn load_keybindings() -> Keybindings {
    load_keybindings_from(user_keybindings_path().as_deref())
}

pub fn load_keybindings_from(user_path: Option<&Path>) -> Keybindings {
    let mut config: KeybindingConfig =
        toml::from_str(DEFAULT_KEYBINDINGS).expect("Failed to parse embedded keybindings.toml");

    if let Some(path) = user_path {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<KeybindingConfig>(&contents) {
                    Ok(user_config) => merge_config(&mut config, user_config),
                    Err(e) => {
                        log::warn!(target: "ui::keybindings", "ignoring malformed {}: {}", path.display(), e)
                    }
                },
                Err(e) => {
                    log::warn!(target: "ui::keybindings", "could not read {}: {}", path.display(), e)
                }
            }
        }
    }

    Keybindings {
        layers: build_layers(&config.layers),
        note_keys: build_note_keys(&config.note_keys),
    }
}

fn user_keybindings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mtrak").join("keybindings.toml"))
}

/// Merge user config into the base config.
/// User layer entries fully replace the default layer entries.
fn merge_config(base: &mut KeybindingConfig, user: KeybindingConfig) {
    for (layer_id, layer_config) in user.layers {
        base.layers.insert(layer_id, layer_config);
    }
    if user.note_keys.scale.is_some() {
        base.note_keys.scale = user.note_keys.scale;
    }
    if user.note_keys.chromatic.is_some() {
        base.note_keys.chromatic = user.note_keys.chromatic;
    }
}

fn build_bindings(layer_name: &str, raw: &[RawBinding]) -> Vec<KeyBinding> {
    raw.iter()
        .filter_map(|b| {
            let pattern = match parse_key(&b.key) {
                Some(p) => p,
                None => {
                    log::warn!(target: "ui::keybindings", "ignoring unknown key '{}' in keybindings", b.key);
                    return None;
                }
            };
            match parse_action_id(layer_name, &b.action) {
                Some(action) => Some(KeyBinding {
                    pattern,
                    action,
                    description: intern(b.description.clone()),
                }),
                None => {
                    log::warn!(target: "ui::keybindings", "ignoring unknown action '{}' in layer '{}'", b.action, layer_name);
                    None
                }
            }
        })
        .collect()
}

fn build_layers(layers: &HashMap<String, LayerConfig>) -> Vec<Layer> {
    layers
        .iter()
        .map(|(name, config)| Layer {
            name: intern(name.clone()),
            keymap: Keymap::from_bindings(build_bindings(name, &config.bindings)),
            transparent: config.transparent,
        })
        .collect()
}

fn build_note_keys(config: &NoteKeysConfig) -> NoteKeys {
    NoteKeys {
        scale: build_note_table("scale", config.scale.as_ref()),
        chromatic: build_note_table("chromatic", config.chromatic.as_ref()),
    }
}

fn build_note_table(name: &str, raw: Option<&HashMap<String, usize>>) -> HashMap<char, usize> {
    raw.into_iter()
        .flatten()
        .filter_map(|(key, &degree)| match single_char(key) {
            Some(c) => Some((c, degree)),
            None => {
                log::warn!(target: "ui::keybindings", "ignoring note key '{}' in '{}': not a single character", key, name);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::action_id::{ActionId, GlobalActionId, GridActionId};
    use crate::ui::layer::{LayerResult, LayerStack};
    use mtrak_core::state::Mode;
    use mtrak_types::Scale;

    #[test]
    fn test_parse_key_char() {
        assert_eq!(parse_key("q"), Some(KeyPattern::Char('q')));
        assert_eq!(parse_key("."), Some(KeyPattern::Char('.')));
        assert_eq!(parse_key("N"), Some(KeyPattern::Char('N')));
    }

    #[test]
    fn test_parse_key_named() {
        assert_eq!(parse_key("Up"), Some(KeyPattern::Key(KeyCode::Up)));
        assert_eq!(parse_key("pgdown"), Some(KeyPattern::Key(KeyCode::PageDown)));
        assert_eq!(parse_key("Space"), Some(KeyPattern::Char(' ')));
    }

    #[test]
    fn test_parse_key_modifiers() {
        assert_eq!(parse_key("Ctrl+s"), Some(KeyPattern::Ctrl('s')));
        assert_eq!(parse_key("ctrl+Z"), Some(KeyPattern::Ctrl('z')));
        assert_eq!(parse_key("Ctrl+Left"), Some(KeyPattern::CtrlKey(KeyCode::Left)));
        assert_eq!(parse_key("Shift+Tab"), Some(KeyPattern::ShiftKey(KeyCode::Tab)));
        assert_eq!(
            parse_key("Ctrl+Shift+Right"),
            Some(KeyPattern::CtrlShiftKey(KeyCode::Right))
        );
    }

    #[test]
    fn test_parse_key_unknown() {
        assert_eq!(parse_key("Bogus"), None);
        assert_eq!(parse_key("Ctrl+Bogus"), None);
        assert_eq!(parse_key("Shift+q"), None);
    }

    #[test]
    fn test_load_embedded_keybindings() {
        let bindings = load_keybindings_from(None);
        let stack = LayerStack::new(bindings.layers);
        assert_eq!(
            stack.resolve(&KeyPattern::Key(KeyCode::Insert)),
            LayerResult::Action(ActionId::Grid(GridActionId::InsertBlock))
        );
        assert_eq!(
            stack.resolve(&KeyPattern::Ctrl('z')),
            LayerResult::Action(ActionId::Global(GlobalActionId::Undo))
        );
        assert_eq!(stack.resolve(&KeyPattern::Char('%')), LayerResult::Blocked);
    }

    #[test]
    fn test_note_keys_wrap_to_next_octave() {
        let keys = load_keybindings_from(None).note_keys;
        let mut notes = NoteContext::new(48);
        assert_eq!(keys.degree('c', &notes), Some(2));
        // major has seven degrees: 'q' is the root an octave up
        assert_eq!(keys.degree('q', &notes), Some(Scale::Major.len()));
        assert_eq!(keys.degree('s', &notes), None);

        notes.chromatic = true;
        assert_eq!(keys.degree('s', &notes), Some(1));
        assert_eq!(keys.degree('q', &notes), Some(12));
    }

    #[test]
    fn test_user_layer_replaces_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keybindings.toml");
        std::fs::write(
            &path,
            r#"
version = 1

[layers.global]
transparent = false
bindings = [
  { key = "Ctrl+x", action = "quit", description = "Quit" },
  { key = "Ctrl+y", action = "no_such_action", description = "?" },
]
"#,
        )
        .unwrap();

        let bindings = load_keybindings_from(Some(&path));
        let mut stack = LayerStack::new(bindings.layers);
        stack.set_mode(Mode::Command);
        assert_eq!(
            stack.resolve(&KeyPattern::Ctrl('x')),
            LayerResult::Action(ActionId::Global(GlobalActionId::Quit))
        );
        assert_eq!(stack.resolve(&KeyPattern::Ctrl('q')), LayerResult::Blocked);
        assert_eq!(stack.resolve(&KeyPattern::Ctrl('y')), LayerResult::Blocked);

        // untouched layers keep their defaults
        stack.set_mode(Mode::Edit);
        assert_eq!(
            stack.resolve(&KeyPattern::Ctrl('c')),
            LayerResult::Action(ActionId::Grid(GridActionId::Copy))
        );
        assert_eq!(bindings.note_keys.degree('z', &NoteContext::new(48)), Some(0));
    }
}
