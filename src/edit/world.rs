//! Host world capabilities consumed by the edit engine
//!
//! The engine never owns world objects. It reaches them by id through [`World`]
//! and reports dirty regions through [`WorldSubsystems`].

use glam::Vec3;

use super::bounds::Bounds;
use super::instance::{InstanceId, InstanceState, Motion};

/// Per-instance capability set, addressed by id
pub trait World {
    /// False once the underlying world object has been deleted
    fn is_valid(&self, id: InstanceId) -> bool;

    fn position(&self, id: InstanceId) -> Option<Vec3>;

    /// Heading in radians
    fn angle(&self, id: InstanceId) -> Option<f32>;

    /// World bounds. `ignore_segments` lets segments answer with a cheaper
    /// approximation.
    fn bounds(&self, id: InstanceId, ignore_segments: bool) -> Option<Bounds>;

    /// End nodes of a segment, `None` for every other kind
    fn segment_ends(&self, id: InstanceId) -> Option<(InstanceId, InstanceId)>;

    /// Terrain height under `position`
    fn sample_height(&self, position: Vec3) -> f32;

    fn save_state(&self, id: InstanceId) -> Option<InstanceState>;

    fn load_state(&mut self, state: &InstanceState);

    /// Move the instance from its captured `state` by `motion`
    fn transform(&mut self, state: &InstanceState, motion: &Motion);

    /// Visual-only mode: display moves, authoritative state does not
    fn set_virtual(&mut self, id: InstanceId, on: bool);

    /// Refit the curves connected to `node` against `target`
    fn auto_curve(&mut self, _node: InstanceId, _target: Option<InstanceId>) {}

    fn drag_started(&mut self, _id: InstanceId) {}

    fn drag_finished(&mut self, _id: InstanceId) {}

    fn subsystems(&mut self) -> &mut dyn WorldSubsystems;
}

/// Downstream systems that recompute derived data for a rectangular area.
///
/// Every area argument is a ground footprint `[min_x, min_z, max_x, max_z]`.
pub trait WorldSubsystems {
    fn update_terrain(&mut self, area: [f32; 4]);

    fn update_zoning(&mut self, area: [f32; 4]);

    /// Props and trees
    fn update_vegetation(&mut self, area: [f32; 4]);

    /// Electricity and water
    fn update_utility_grids(&mut self, area: [f32; 4]);

    fn render_group_count(&self) -> usize;

    /// Flag every layer of a render group dirty
    fn mark_render_group_dirty(&mut self, index: usize);

    /// Deferred refresh of a pending region
    fn refresh_area(&mut self, bounds: &Bounds);
}
