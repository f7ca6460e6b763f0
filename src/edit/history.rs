//! Bounded undo/redo history of applied actions

use std::collections::{HashMap, VecDeque};

use super::action::{Action, ActionContext};
use super::instance::InstanceId;

/// Undo and redo stacks. Actions are pushed after they have been applied.
pub struct ActionHistory {
    undo_stack: VecDeque<Box<dyn Action>>,
    redo_stack: Vec<Box<dyn Action>>,
    max_depth: usize,
}

impl ActionHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record an applied action. Clears redo; drops the oldest entry when full.
    pub fn push(&mut self, action: Box<dyn Action>) {
        self.redo_stack.clear();
        self.undo_stack.push_back(action);
        while self.undo_stack.len() > self.max_depth {
            if let Some(dropped) = self.undo_stack.pop_front() {
                log::debug!("[History] Dropped oldest action '{}'", dropped.name());
            }
        }
    }

    /// Undo the latest action, returns its name
    pub fn undo(&mut self, ctx: &mut ActionContext<'_>) -> Option<&'static str> {
        let mut action = self.undo_stack.pop_back()?;
        action.undo(ctx);
        let name = action.name();
        self.redo_stack.push(action);
        Some(name)
    }

    /// Re-apply the latest undone action, returns its name
    pub fn redo(&mut self, ctx: &mut ActionContext<'_>) -> Option<&'static str> {
        let mut action = self.redo_stack.pop()?;
        action.apply(ctx);
        let name = action.name();
        self.undo_stack.push_back(action);
        Some(name)
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

    fn actions_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Action>> {
        self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut())
    }

    pub fn replace_instances(&mut self, mapping: &HashMap<InstanceId, InstanceId>) {
        for action in self.actions_mut() {
            action.replace_instances(mapping);
        }
    }

    pub fn update_node_id_in_segment_state(&mut self, old: InstanceId, new: InstanceId) {
        for action in self.actions_mut() {
            action.update_node_id_in_segment_state(old, new);
        }
    }
}
