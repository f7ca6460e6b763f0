//! Group move/rotate of the selection
//!
//! A [`TransformAction`] captures every selected instance when it is created and
//! fixes the pivot at the selection centre. While the user drags, only the deltas
//! change; [`Action::apply`] always transforms from the captured snapshots, so it
//! can run every frame without drift.
//!
//! Segments are derived from their end nodes. Within one apply or undo every
//! non-segment snapshot is processed before any segment snapshot.

use glam::Vec3;
use std::collections::HashMap;

use super::action::{Action, ActionContext, OverlaySink, Rgba};
use super::bounds::Bounds;
use super::geometry;
use super::instance::{InstanceId, InstanceKind, InstanceState, Motion};
use super::selection::Selection;
use super::world::World;

/// Move/rotate of the whole selection about a fixed pivot
#[derive(Clone, Debug)]
pub struct TransformAction {
    pub move_delta: Vec3,
    pub angle_delta: f32,
    /// Added on top of `angle_delta` when snapping to angle increments
    pub snap_angle: f32,
    pub follow_terrain: bool,
    /// Refit node curves against `segment_curve` after moving them
    pub auto_curve: bool,
    pub segment_curve: Option<InstanceId>,
    center: Vec3,
    /// Selection bounds at capture time, the pivot is their centre
    captured_bounds: Option<Bounds>,
    contains_network: bool,
    states: Vec<InstanceState>,
    is_virtual: bool,
    /// Set once an apply has moved authoritative state
    moved_live: bool,
}

impl TransformAction {
    pub fn new(world: &dyn World, selection: &Selection) -> Self {
        let mut states = Vec::with_capacity(selection.len());
        let mut contains_network = false;

        for id in selection.iter() {
            if !world.is_valid(id) {
                continue;
            }
            if let Some(state) = world.save_state(id) {
                contains_network |= id.kind.is_network();
                states.push(state);
            }
        }

        let captured_bounds = geometry::total_bounds(world, selection, true, false);
        let center = captured_bounds.map(|b| b.center()).unwrap_or(Vec3::ZERO);

        log::debug!(
            "[Transform] Captured {} states, center=({:.3}, {:.3}, {:.3}), network={}",
            states.len(),
            center.x,
            center.y,
            center.z,
            contains_network
        );

        Self {
            move_delta: Vec3::ZERO,
            angle_delta: 0.0,
            snap_angle: 0.0,
            follow_terrain: false,
            auto_curve: false,
            segment_curve: None,
            center,
            captured_bounds,
            contains_network,
            states,
            is_virtual: false,
            moved_live: false,
        }
    }

    /// Rotation pivot, fixed at construction
    pub fn pivot(&self) -> Vec3 {
        self.center
    }

    pub fn contains_network(&self) -> bool {
        self.contains_network
    }

    pub fn states(&self) -> &[InstanceState] {
        &self.states
    }

    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Whether any apply ran outside virtual mode, i.e. the world needs an
    /// undo to get back to the captured placements
    pub fn moved_live(&self) -> bool {
        self.moved_live
    }

    pub fn set_move(&mut self, delta: Vec3) {
        self.move_delta = delta;
    }

    pub fn set_rotation(&mut self, angle_delta: f32, snap_angle: f32) {
        self.angle_delta = angle_delta;
        self.snap_angle = snap_angle;
    }

    /// Switch preview-only mode.
    ///
    /// Turning it on is refused (returns false) when already on or when the
    /// selection is too large. Turning it off clears the visual-only flags if they
    /// were set, commits the transform and fully invalidates the touched area.
    pub fn set_virtual(&mut self, ctx: &mut ActionContext<'_>, on: bool) -> bool {
        if on {
            if self.is_virtual || ctx.selection.len() >= ctx.config.max_virtual_selection_size {
                return false;
            }
            self.is_virtual = true;
            for id in ctx.selection.iter() {
                ctx.world.set_virtual(id, true);
            }
            return true;
        }

        if self.is_virtual {
            self.is_virtual = false;
            for id in ctx.selection.iter() {
                ctx.world.set_virtual(id, false);
            }
        }

        let before = geometry::total_bounds(&*ctx.world, ctx.selection, false, false);
        self.apply(ctx);
        let after = geometry::total_bounds(&*ctx.world, ctx.selection, false, false);
        let touched = match (before, after) {
            (Some(b), Some(a)) => Some(b.union(&a)),
            (b, a) => b.or(a),
        };
        ctx.update_area(touched, true);
        true
    }

    /// Drop preview mode without committing. Authoritative state was never
    /// touched, so clearing the flags is enough.
    pub fn discard(&mut self, ctx: &mut ActionContext<'_>) {
        if !self.is_virtual {
            return;
        }
        self.is_virtual = false;
        for id in ctx.selection.iter() {
            ctx.world.set_virtual(id, false);
        }
    }

    pub fn initialise_drag(&mut self, ctx: &mut ActionContext<'_>) {
        if self.is_virtual {
            self.set_virtual(ctx, false);
        }
        for state in self.states.iter().filter(|s| s.id.kind == InstanceKind::Building) {
            ctx.world.drag_started(state.id);
        }
    }

    pub fn finalise_drag(&mut self, ctx: &mut ActionContext<'_>) {
        if self.is_virtual {
            self.set_virtual(ctx, false);
        }
        for state in self.states.iter().filter(|s| s.id.kind == InstanceKind::Building) {
            ctx.world.drag_finished(state.id);
        }
    }

    /// Where every captured instance would end up for the given deltas.
    ///
    /// Touches neither the world nor the stored snapshots.
    pub fn calculate_states(
        &self,
        world: &dyn World,
        delta_position: Vec3,
        delta_angle: f32,
        center: Vec3,
        follow_terrain: bool,
    ) -> Vec<InstanceState> {
        let motion = Motion::new(center, delta_position, delta_angle, follow_terrain);

        self.states
            .iter()
            .filter(|state| world.is_valid(state.id))
            .map(|state| motion.apply_to(state, |p| world.sample_height(p)))
            .collect()
    }

    fn motion(&self) -> Motion {
        Motion::new(self.center, self.move_delta, self.angle_delta + self.snap_angle, self.follow_terrain)
    }
}

impl Action for TransformAction {
    fn name(&self) -> &'static str {
        "Transform"
    }

    fn apply(&mut self, ctx: &mut ActionContext<'_>) {
        let original_bounds = geometry::total_bounds(&*ctx.world, ctx.selection, false, false);
        let motion = self.motion();

        for state in self.states.iter().filter(|s| !s.is_segment()) {
            if !ctx.world.is_valid(state.id) {
                continue;
            }
            ctx.world.transform(state, &motion);

            if self.auto_curve && state.id.kind == InstanceKind::Node {
                ctx.world.auto_curve(state.id, self.segment_curve);
            }
        }

        for state in self.states.iter().filter(|s| s.is_segment()) {
            if ctx.world.is_valid(state.id) {
                ctx.world.transform(state, &motion);
            }
        }

        log::debug!(
            "[Transform] Apply: {} states, delta=({:.3}, {:.3}, {:.3}), angle={:.4}, virtual={}",
            self.states.len(),
            self.move_delta.x,
            self.move_delta.y,
            self.move_delta.z,
            self.angle_delta + self.snap_angle,
            self.is_virtual
        );

        if self.is_virtual {
            return;
        }
        self.moved_live = true;

        let large = ctx.selection.len() > ctx.config.max_virtual_selection_size;
        let full = !(large || ctx.modifiers.fast_move_active());

        ctx.update_area(original_bounds, full);
        let final_bounds = geometry::total_bounds(&*ctx.world, ctx.selection, false, false);
        ctx.update_area(final_bounds, full);
    }

    fn undo(&mut self, ctx: &mut ActionContext<'_>) {
        let bounds = geometry::total_bounds(&*ctx.world, ctx.selection, false, false);

        for state in self.states.iter().filter(|s| !s.is_segment()) {
            if ctx.world.is_valid(state.id) {
                ctx.world.load_state(state);
            }
        }

        for state in self.states.iter().filter(|s| s.is_segment()) {
            if ctx.world.is_valid(state.id) {
                ctx.world.load_state(state);
            }
        }

        log::debug!("[Transform] Undo: {} states", self.states.len());

        ctx.update_area(bounds, true);
        let restored = geometry::total_bounds(&*ctx.world, ctx.selection, false, false);
        ctx.update_area(restored, true);
    }

    fn replace_instances(&mut self, mapping: &HashMap<InstanceId, InstanceId>) {
        for state in &mut self.states {
            if let Some(replacement) = mapping.get(&state.id) {
                log::debug!("[Transform] Replacing: {} -> {}", state.id, replacement);
                state.replace_instance(*replacement);
            }
        }
    }

    /// Outline of the selection where it started, and where the current move
    /// delta takes it
    fn overlays(&self, sink: &mut dyn OverlaySink, selected: Rgba, preview: Rgba) {
        let Some(start) = self.captured_bounds else {
            return;
        };
        sink.draw_bounds(&start, selected);
        if self.move_delta != Vec3::ZERO {
            let moved = Bounds::new(start.min + self.move_delta, start.max + self.move_delta);
            sink.draw_bounds(&moved, preview);
        }
    }

    fn update_node_id_in_segment_state(&mut self, old: InstanceId, new: InstanceId) {
        for segment in self.states.iter_mut().filter_map(|s| s.segment.as_mut()) {
            if segment.start_node == old {
                segment.start_node = new;
            }
            if segment.end_node == old {
                segment.end_node = new;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::action::Modifiers;
    use crate::edit::config::EngineConfig;
    use crate::edit::invalidation::InvalidationTracker;
    use crate::sim::{JournalEntry, SimTerrain, SimWorld};
    use std::f32::consts::FRAC_PI_2;

    struct Harness {
        world: SimWorld,
        selection: Selection,
        tracker: InvalidationTracker,
        config: EngineConfig,
        modifiers: Modifiers,
    }

    impl Harness {
        fn new(world: SimWorld, ids: &[InstanceId]) -> Self {
            let config = EngineConfig::default();
            Self {
                world,
                selection: ids.iter().copied().collect(),
                tracker: InvalidationTracker::new(config.grid.clone()),
                config,
                modifiers: Modifiers::default(),
            }
        }

        fn ctx(&mut self) -> ActionContext<'_> {
            ActionContext {
                world: &mut self.world,
                selection: &self.selection,
                tracker: &mut self.tracker,
                config: &self.config,
                modifiers: self.modifiers,
            }
        }

        fn action(&self) -> TransformAction {
            TransformAction::new(&self.world, &self.selection)
        }
    }

    fn road_world() -> SimWorld {
        let mut world = SimWorld::with_terrain(SimTerrain { base: 0.0, slope_x: 0.1, slope_z: 0.0 });
        world.add_object(InstanceId::node(1), Vec3::new(0.0, 0.0, 0.0), 0.0, Vec3::splat(4.0));
        world.add_object(InstanceId::node(2), Vec3::new(20.0, 2.0, 0.0), 0.0, Vec3::splat(4.0));
        world.add_segment(5, InstanceId::node(1), InstanceId::node(2), 8.0).unwrap();
        world.add_object(InstanceId::building(3), Vec3::new(10.0, 1.0, 10.0), 0.3, Vec3::new(6.0, 8.0, 6.0));
        world
    }

    fn road_ids() -> Vec<InstanceId> {
        vec![InstanceId::segment(5), InstanceId::node(1), InstanceId::node(2), InstanceId::building(3)]
    }

    #[test]
    fn test_segments_follow_nodes_on_apply_and_undo() {
        let mut h = Harness::new(road_world(), &road_ids());
        let mut action = h.action();
        action.set_move(Vec3::new(5.0, 0.0, 5.0));
        action.apply(&mut h.ctx());

        let journal = h.world.journal().to_vec();
        let segment_at = journal
            .iter()
            .position(|e| *e == JournalEntry::Transform(InstanceId::segment(5)))
            .expect("segment transformed");
        assert_eq!(segment_at, journal.len() - 1, "segment must be last: {:?}", journal);

        h.world.clear_journal();
        action.undo(&mut h.ctx());
        let journal = h.world.journal().to_vec();
        assert_eq!(journal.len(), 4);
        assert_eq!(journal[3], JournalEntry::Load(InstanceId::segment(5)));
    }

    #[test]
    fn test_quarter_turn_about_pivot() {
        let mut world = SimWorld::new();
        world.add_object(InstanceId::prop(1), Vec3::new(-5.0, 0.0, 0.0), 0.0, Vec3::splat(2.0));
        world.add_object(InstanceId::prop(2), Vec3::new(5.0, 0.0, 0.0), 0.0, Vec3::splat(2.0));
        let mut h = Harness::new(world, &[InstanceId::prop(1), InstanceId::prop(2)]);

        let mut action = h.action();
        assert_eq!(action.pivot(), Vec3::ZERO);
        action.set_rotation(FRAC_PI_2, 0.0);
        action.apply(&mut h.ctx());

        let p = h.world.position(InstanceId::prop(2)).unwrap();
        assert!((p - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4, "got {:?}", p);
        let angle = h.world.angle(InstanceId::prop(2)).unwrap();
        assert!((angle - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_snap_angle_adds_to_rotation() {
        let mut world = SimWorld::new();
        world.add_object(InstanceId::prop(1), Vec3::new(3.0, 0.0, 0.0), 0.0, Vec3::splat(2.0));
        let mut h = Harness::new(world, &[InstanceId::prop(1)]);

        let mut action = h.action();
        action.set_rotation(0.2, 0.1);
        action.apply(&mut h.ctx());
        let angle = h.world.angle(InstanceId::prop(1)).unwrap();
        assert!((angle - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_stale_instances_are_skipped() {
        let mut world = SimWorld::new();
        world.add_object(InstanceId::prop(1), Vec3::ZERO, 0.0, Vec3::splat(2.0));
        world.add_object(InstanceId::prop(2), Vec3::new(4.0, 0.0, 0.0), 0.0, Vec3::splat(2.0));
        let mut h = Harness::new(world, &[InstanceId::prop(1), InstanceId::prop(2)]);

        let mut action = h.action();
        h.world.delete(InstanceId::prop(1));
        action.set_move(Vec3::new(0.0, 0.0, 3.0));
        action.apply(&mut h.ctx());

        assert_eq!(h.world.position(InstanceId::prop(2)), Some(Vec3::new(4.0, 0.0, 3.0)));
        assert!(!h.world.journal().contains(&JournalEntry::Transform(InstanceId::prop(1))));

        action.undo(&mut h.ctx());
        assert_eq!(h.world.position(InstanceId::prop(2)), Some(Vec3::new(4.0, 0.0, 0.0)));
    }

    #[test]
    fn test_invalid_instances_are_not_captured() {
        let mut world = road_world();
        world.delete(InstanceId::building(3));
        let h = Harness::new(world, &road_ids());
        let action = h.action();
        assert_eq!(action.states().len(), 3);
        assert!(action.contains_network());
    }

    #[test]
    fn test_fast_move_uses_cheap_invalidation() {
        let mut h = Harness::new(road_world(), &road_ids());
        h.modifiers.fast_move_toggle = true;
        let mut action = h.action();
        action.set_move(Vec3::new(1.0, 0.0, 0.0));
        action.apply(&mut h.ctx());

        assert!(h.world.subsystem_log().terrain.is_empty());
        assert_eq!(h.tracker.pending().len(), 2);

        // Shift flips it back to a full refresh
        h.modifiers.shift = true;
        action.apply(&mut h.ctx());
        assert_eq!(h.world.subsystem_log().terrain.len(), 2);
    }

    #[test]
    fn test_large_selection_uses_cheap_invalidation() {
        let mut h = Harness::new(road_world(), &road_ids());
        h.config.max_virtual_selection_size = 2;
        let mut action = h.action();
        action.apply(&mut h.ctx());
        assert!(h.world.subsystem_log().terrain.is_empty());
        assert_eq!(h.tracker.pending().len(), 2);
    }

    #[test]
    fn test_undo_is_always_full() {
        let mut h = Harness::new(road_world(), &road_ids());
        h.modifiers.fast_move_toggle = true;
        let mut action = h.action();
        action.apply(&mut h.ctx());
        action.undo(&mut h.ctx());
        assert_eq!(h.world.subsystem_log().terrain.len(), 2);
    }

    #[test]
    fn test_virtual_preview_then_commit() {
        let mut h = Harness::new(road_world(), &road_ids());
        let node = InstanceId::node(1);
        let mut action = h.action();

        assert!(action.set_virtual(&mut h.ctx(), true));
        assert!(!action.set_virtual(&mut h.ctx(), true), "already virtual");
        assert!(h.world.is_virtual(node));

        action.set_move(Vec3::new(0.0, 0.0, 4.0));
        action.apply(&mut h.ctx());
        assert_eq!(h.world.position(node), Some(Vec3::ZERO));
        assert_eq!(h.world.display_position(node), Some(Vec3::new(0.0, 0.0, 4.0)));
        assert!(h.tracker.pending().is_empty(), "preview frames skip invalidation");

        assert!(action.set_virtual(&mut h.ctx(), false));
        assert!(!h.world.is_virtual(node));
        assert_eq!(h.world.position(node), Some(Vec3::new(0.0, 0.0, 4.0)));
        assert!(!h.world.subsystem_log().terrain.is_empty());
    }

    #[test]
    fn test_virtual_rejected_above_threshold_but_commit_still_works() {
        let mut h = Harness::new(road_world(), &road_ids());
        h.config.max_virtual_selection_size = 3;
        let mut action = h.action();

        assert!(!action.set_virtual(&mut h.ctx(), true));
        assert!(!action.is_virtual());
        assert!(!h.world.is_virtual(InstanceId::node(1)));

        action.set_move(Vec3::new(2.0, 0.0, 0.0));
        assert!(action.set_virtual(&mut h.ctx(), false));
        assert_eq!(h.world.position(InstanceId::node(1)), Some(Vec3::new(2.0, 0.0, 0.0)));
        assert!(!h.world.subsystem_log().terrain.is_empty());
        assert!(!h.tracker.pending().is_empty());
    }

    #[test]
    fn test_discard_leaves_world_untouched() {
        let mut h = Harness::new(road_world(), &road_ids());
        let mut action = h.action();
        action.set_virtual(&mut h.ctx(), true);
        action.set_move(Vec3::new(9.0, 0.0, 9.0));
        action.apply(&mut h.ctx());
        action.discard(&mut h.ctx());

        let building = InstanceId::building(3);
        assert_eq!(h.world.position(building), Some(Vec3::new(10.0, 1.0, 10.0)));
        assert_eq!(h.world.display_position(building), Some(Vec3::new(10.0, 1.0, 10.0)));
        assert!(!action.is_virtual());
    }

    #[test]
    fn test_moved_live_survives_switch_to_virtual() {
        let mut h = Harness::new(road_world(), &road_ids());
        let mut action = h.action();
        assert!(!action.moved_live());

        action.set_virtual(&mut h.ctx(), true);
        action.apply(&mut h.ctx());
        assert!(!action.moved_live(), "virtual frames leave the world alone");

        action.discard(&mut h.ctx());
        action.apply(&mut h.ctx());
        action.set_virtual(&mut h.ctx(), true);
        assert!(action.moved_live());
    }

    #[test]
    fn test_auto_curve_after_node_transform() {
        let mut h = Harness::new(road_world(), &road_ids());
        let mut action = h.action();
        action.auto_curve = true;
        action.segment_curve = Some(InstanceId::segment(5));
        action.apply(&mut h.ctx());

        let journal = h.world.journal();
        let moved = journal.iter().position(|e| *e == JournalEntry::Transform(InstanceId::node(1))).unwrap();
        assert_eq!(journal[moved + 1], JournalEntry::AutoCurve(InstanceId::node(1)));
        assert!(!journal.contains(&JournalEntry::AutoCurve(InstanceId::building(3))));
        assert!(h.world.is_curve_fitted(InstanceId::segment(5)));
    }

    #[test]
    fn test_replace_instances_redirects_snapshots() {
        let mut world = SimWorld::new();
        world.add_object(InstanceId::prop(1), Vec3::ZERO, 0.0, Vec3::splat(2.0));
        let mut h = Harness::new(world, &[InstanceId::prop(1)]);
        let mut action = h.action();

        h.world.add_object(InstanceId::prop(9), Vec3::new(50.0, 0.0, 0.0), 0.0, Vec3::splat(2.0));
        let mapping = HashMap::from([(InstanceId::prop(1), InstanceId::prop(9))]);
        action.replace_instances(&mapping);
        assert_eq!(action.states()[0].id, InstanceId::prop(9));

        action.set_move(Vec3::new(1.0, 0.0, 0.0));
        action.apply(&mut h.ctx());
        // The captured values travel with the snapshot
        assert_eq!(h.world.position(InstanceId::prop(9)), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(h.world.position(InstanceId::prop(1)), Some(Vec3::ZERO));
    }

    #[test]
    fn test_node_renumbering_updates_segment_states() {
        let h = Harness::new(road_world(), &road_ids());
        let mut action = h.action();
        action.update_node_id_in_segment_state(InstanceId::node(2), InstanceId::node(40));

        let segment = action
            .states()
            .iter()
            .find_map(|s| s.segment.as_ref())
            .expect("segment state");
        assert_eq!(segment.start_node, InstanceId::node(1));
        assert_eq!(segment.end_node, InstanceId::node(40));
    }

    struct OutlineSink(Vec<(Bounds, Rgba)>);

    impl OverlaySink for OutlineSink {
        fn draw_bounds(&mut self, bounds: &Bounds, color: Rgba) {
            self.0.push((*bounds, color));
        }
    }

    #[test]
    fn test_overlays_outline_start_and_preview() {
        let mut world = SimWorld::new();
        world.add_object(InstanceId::prop(1), Vec3::ZERO, 0.0, Vec3::splat(2.0));
        let h = Harness::new(world, &[InstanceId::prop(1)]);
        let selected = [1.0, 1.0, 1.0, 1.0];
        let preview = [0.0, 1.0, 0.0, 0.5];

        let mut action = h.action();
        let mut sink = OutlineSink(Vec::new());
        action.overlays(&mut sink, selected, preview);
        assert_eq!(sink.0.len(), 1);
        assert_eq!(sink.0[0].1, selected);

        action.set_move(Vec3::new(5.0, 0.0, 0.0));
        let mut sink = OutlineSink(Vec::new());
        action.overlays(&mut sink, selected, preview);
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[1], (Bounds::new(Vec3::new(4.0, -1.0, -1.0), Vec3::new(6.0, 1.0, 1.0)), preview));
    }

    #[test]
    fn test_empty_selection_draws_nothing() {
        let h = Harness::new(SimWorld::new(), &[]);
        let action = h.action();
        let mut sink = OutlineSink(Vec::new());
        action.overlays(&mut sink, [1.0; 4], [1.0; 4]);
        assert!(sink.0.is_empty());
        assert_eq!(action.pivot(), Vec3::ZERO);
    }

    #[test]
    fn test_drag_notifies_buildings_only() {
        let mut h = Harness::new(road_world(), &road_ids());
        let mut action = h.action();
        action.initialise_drag(&mut h.ctx());
        action.finalise_drag(&mut h.ctx());
        assert_eq!(
            h.world.journal(),
            &[
                JournalEntry::DragStarted(InstanceId::building(3)),
                JournalEntry::DragFinished(InstanceId::building(3)),
            ]
        );
    }
}
