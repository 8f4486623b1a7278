use std::collections::{HashMap, HashSet};

use mtrak_core::state::Mode;

use super::action_id::ActionId;
use super::keymap::Keymap;
use super::KeyPattern;

/// A named layer with a keymap and transparency setting.
pub struct Layer {
    pub name: &'static str,
    pub keymap: Keymap,
    pub transparent: bool,
}

/// Result of resolving a key through the layer stack.
#[derive(Debug, PartialEq, Eq)]
pub enum LayerResult {
    /// A layer matched the key with this action ID.
    Action(ActionId),
    /// An opaque layer blocked the key without matching it.
    Blocked,
    /// No layer matched the key and all layers were transparent.
    Unresolved,
}

/// A stack of named layers that resolves keys top-to-bottom.
pub struct LayerStack {
    layers: HashMap<&'static str, Layer>,
    active: Vec<&'static str>, // bottom-to-top
}

impl LayerStack {
    pub fn new(layers: Vec<Layer>) -> Self {
        let map: HashMap<&'static str, Layer> = layers.into_iter().map(|l| (l.name, l)).collect();
        let mut stack = Self {
            layers: map,
            active: Vec::new(),
        };
        stack.set_mode(Mode::Edit);
        stack
    }

    /// Activate the layers for an input mode, with `global` at the bottom.
    pub fn set_mode(&mut self, mode: Mode) {
        self.active.clear();
        self.push("global");
        match mode {
            Mode::Edit | Mode::Select => self.push("edit"),
            Mode::Note => self.push("note"),
            Mode::Command => {}
        }
    }

    /// Resolve a key through the active layer stack (top-to-bottom).
    pub fn resolve(&self, key: &KeyPattern) -> LayerResult {
        for name in self.active.iter().rev() {
            if let Some(layer) = self.layers.get(name) {
                if let Some(action) = layer.keymap.lookup(key) {
                    return LayerResult::Action(action);
                }
                if !layer.transparent {
                    return LayerResult::Blocked;
                }
            }
        }
        LayerResult::Unresolved
    }

    fn push(&mut self, name: &'static str) {
        if self.layers.contains_key(name) && !self.active.contains(&name) {
            self.active.push(name);
        }
    }

    /// Bindings reachable from the active layers, shadowed keys removed.
    /// Walks top-to-bottom, matching resolution priority.
    pub fn collect_bindings(&self) -> Vec<(String, &'static str)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in self.active.iter().rev() {
            if let Some(layer) = self.layers.get(name) {
                for binding in layer.keymap.bindings() {
                    if seen.insert(binding.pattern) {
                        out.push((binding.pattern.display(), binding.description));
                    }
                }
                if !layer.transparent {
                    break;
                }
            }
        }
        out
    }
}
