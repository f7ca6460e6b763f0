//! Server state management for the bridge

use crate::edit::{
    ActionContext, ActionHistory, EngineConfig, InvalidationTracker, Modifiers, Selection, TransformAction,
};
use crate::sim::SimWorld;

/// Everything one editing session owns
pub struct BridgeState {
    pub config: EngineConfig,
    pub world: SimWorld,
    pub selection: Selection,
    pub tracker: InvalidationTracker,
    pub history: ActionHistory,
    pub modifiers: Modifiers,
    /// Transform being dragged, not yet pushed to history
    pub active: Option<TransformAction>,
    pub scene_path: Option<String>,
}

impl BridgeState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            world: SimWorld::new(),
            selection: Selection::new(),
            tracker: InvalidationTracker::new(config.grid.clone()),
            history: ActionHistory::new(config.max_undo_depth),
            modifiers: Modifiers::default(),
            active: None,
            scene_path: None,
            config,
        }
    }

    /// Drop everything tied to the current world
    pub fn reset(&mut self, world: SimWorld) {
        self.world = world;
        self.selection.clear();
        self.tracker.clear();
        self.history.clear();
        self.active = None;
    }

    /// Split borrows: the action context plus the session slots that are
    /// mutated alongside it
    pub fn parts(&mut self) -> (ActionContext<'_>, &mut Option<TransformAction>, &mut ActionHistory) {
        let ctx = ActionContext {
            world: &mut self.world,
            selection: &self.selection,
            tracker: &mut self.tracker,
            config: &self.config,
            modifiers: self.modifiers,
        };
        (ctx, &mut self.active, &mut self.history)
    }
}

impl Default for BridgeState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
