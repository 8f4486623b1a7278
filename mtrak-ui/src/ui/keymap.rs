use std::collections::HashMap;

use super::action_id::ActionId;
use super::KeyPattern;

/// A single key binding with its description.
#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub pattern: KeyPattern,
    pub action: ActionId,
    pub description: &'static str,
}

/// Bindings of one layer. The first binding for a key wins.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<KeyBinding>,
    index: HashMap<KeyPattern, usize>,
}

impl Keymap {
    pub fn from_bindings(bindings: Vec<KeyBinding>) -> Self {
        let mut index = HashMap::new();
        for (i, binding) in bindings.iter().enumerate() {
            index.entry(binding.pattern).or_insert(i);
        }
        Self { bindings, index }
    }

    pub fn lookup(&self, key: &KeyPattern) -> Option<ActionId> {
        self.index.get(key).map(|&i| self.bindings[i].action)
    }

    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::action_id::GridActionId;
    use crate::ui::KeyCode;

    #[test]
    fn test_first_binding_wins() {
        let keymap = Keymap::from_bindings(vec![
            KeyBinding {
                pattern: KeyPattern::Key(KeyCode::Up),
                action: ActionId::Grid(GridActionId::Up),
                description: "Cursor up",
            },
            KeyBinding {
                pattern: KeyPattern::Key(KeyCode::Up),
                action: ActionId::Grid(GridActionId::FirstRow),
                description: "First row",
            },
        ]);
        assert_eq!(
            keymap.lookup(&KeyPattern::Key(KeyCode::Up)),
            Some(ActionId::Grid(GridActionId::Up))
        );
        assert_eq!(keymap.lookup(&KeyPattern::Key(KeyCode::Down)), None);
        assert_eq!(keymap.bindings().len(), 2);
    }
}
