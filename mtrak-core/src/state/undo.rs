use std::collections::VecDeque;

use mtrak_types::{Action, Origin};

/// Entries kept in each direction.
pub const MAX_UNDOABLE_ACTIONS: usize = 64;

/// Applied actions that can be reverted, and reverted actions that can be
/// re-applied.
///
/// Entries are recorded once playback reports them as applied. Undo and
/// redo are two-phase: build the action to submit, then commit once the
/// submit succeeded.
pub struct UndoHistory {
    undo_stack: VecDeque<Action>,
    redo_stack: VecDeque<Action>,
    max_depth: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(MAX_UNDOABLE_ACTIONS)
    }
}

impl UndoHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record an applied action. Actions without an undo op are ignored; a
    /// new user action invalidates the redo history.
    pub fn record(&mut self, action: Action) {
        if !action.is_undoable() {
            return;
        }
        if action.origin == Origin::User {
            self.redo_stack.clear();
        }
        push_bounded(&mut self.undo_stack, action, self.max_depth);
    }

    /// The action that reverts the newest entry.
    pub fn undo_action(&self) -> Option<Action> {
        let entry = self.undo_stack.back()?;
        Some(Action {
            op: entry.undo.clone()?,
            undo: None,
            origin: Origin::Undo,
        })
    }

    /// Move the newest entry to the redo history.
    pub fn commit_undo(&mut self) {
        if let Some(entry) = self.undo_stack.pop_back() {
            push_bounded(&mut self.redo_stack, entry, self.max_depth);
        }
    }

    /// The action that re-applies the newest reverted entry. It carries its
    /// undo op so it is recorded again once applied.
    pub fn redo_action(&self) -> Option<Action> {
        let entry = self.redo_stack.back()?;
        Some(Action {
            op: entry.op.clone(),
            undo: entry.undo.clone(),
            origin: Origin::Redo,
        })
    }

    pub fn commit_redo(&mut self) {
        self.redo_stack.pop_back();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<Action>, action: Action, max_depth: usize) {
    if stack.len() >= max_depth {
        stack.pop_front();
    }
    stack.push_back(action);
}
