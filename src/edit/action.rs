//! Undoable commands and the context they run in

use std::collections::HashMap;

use super::bounds::Bounds;
use super::config::EngineConfig;
use super::instance::InstanceId;
use super::invalidation::InvalidationTracker;
use super::selection::Selection;
use super::world::World;

/// RGBA colour passed to overlay hooks
pub type Rgba = [f32; 4];

/// Keyboard state relevant to edits
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Tool setting that makes fast move the default
    pub fast_move_toggle: bool,
    pub shift: bool,
}

impl Modifiers {
    /// Shift inverts the fast move setting
    pub fn fast_move_active(&self) -> bool {
        self.fast_move_toggle != self.shift
    }
}

/// Everything an action touches while it runs
pub struct ActionContext<'a> {
    pub world: &'a mut dyn World,
    pub selection: &'a Selection,
    pub tracker: &'a mut InvalidationTracker,
    pub config: &'a EngineConfig,
    pub modifiers: Modifiers,
}

impl ActionContext<'_> {
    /// Mark an area dirty. Rejected bounds are logged and dropped.
    pub fn update_area(&mut self, bounds: Option<Bounds>, full: bool) {
        let Some(bounds) = bounds else {
            return;
        };
        if let Err(e) = self.tracker.mark_dirty(bounds, full, self.world.subsystems()) {
            log::warn!("[Invalidation] Dropped area update (full={}): {}", full, e);
        }
    }
}

/// Receives overlay shapes from [`Action::overlays`]
pub trait OverlaySink {
    fn draw_bounds(&mut self, bounds: &Bounds, color: Rgba);
}

/// An undoable edit
pub trait Action {
    fn name(&self) -> &'static str;

    /// Apply the forward effect
    fn apply(&mut self, ctx: &mut ActionContext<'_>);

    /// Exactly reverse [`Action::apply`]
    fn undo(&mut self, ctx: &mut ActionContext<'_>);

    /// Rewrite instance references after ids were reassigned
    fn replace_instances(&mut self, mapping: &HashMap<InstanceId, InstanceId>);

    fn on_hover(&mut self) {}

    fn overlays(&self, _sink: &mut dyn OverlaySink, _selected: Rgba, _preview: Rgba) {}

    /// A network node was renumbered
    fn update_node_id_in_segment_state(&mut self, _old: InstanceId, _new: InstanceId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_move_is_xor() {
        assert!(!Modifiers { fast_move_toggle: false, shift: false }.fast_move_active());
        assert!(Modifiers { fast_move_toggle: true, shift: false }.fast_move_active());
        assert!(Modifiers { fast_move_toggle: false, shift: true }.fast_move_active());
        assert!(!Modifiers { fast_move_toggle: true, shift: true }.fast_move_active());
    }
}
