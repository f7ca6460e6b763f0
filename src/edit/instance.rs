//! Instance identity, snapshots, and the rigid motion applied to them
//!
//! Instances live in the host world and are addressed by [`InstanceId`]. A
//! snapshot ([`InstanceState`]) holds the id as a handle, never the instance
//! itself, so the instance may disappear between capture and use; every
//! consumer checks validity through the world first.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::world::World;

/// Closed set of selectable object kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstanceKind {
    Building,
    /// Procedural object
    Proc,
    Prop,
    Tree,
    Node,
    Segment,
    Decal,
}

impl InstanceKind {
    /// Kinds whose angle takes part in mean heading
    pub fn bears_heading(self) -> bool {
        matches!(self, InstanceKind::Building | InstanceKind::Proc | InstanceKind::Prop)
    }

    pub fn is_network(self) -> bool {
        matches!(self, InstanceKind::Node | InstanceKind::Segment)
    }

    /// Segments are derived from their end nodes and are applied after everything else
    pub fn is_segment(self) -> bool {
        self == InstanceKind::Segment
    }
}

/// Unique identifier of an instance in the host world
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId {
    pub kind: InstanceKind,
    pub raw: u32,
}

impl InstanceId {
    pub fn new(kind: InstanceKind, raw: u32) -> Self {
        Self { kind, raw }
    }

    pub fn building(raw: u32) -> Self {
        Self::new(InstanceKind::Building, raw)
    }

    pub fn prop(raw: u32) -> Self {
        Self::new(InstanceKind::Prop, raw)
    }

    pub fn tree(raw: u32) -> Self {
        Self::new(InstanceKind::Tree, raw)
    }

    pub fn node(raw: u32) -> Self {
        Self::new(InstanceKind::Node, raw)
    }

    pub fn segment(raw: u32) -> Self {
        Self::new(InstanceKind::Segment, raw)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.raw)
    }
}

/// Extra state carried by segment snapshots
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentState {
    pub start_node: InstanceId,
    pub end_node: InstanceId,
}

/// Transform-relevant state of one instance at capture time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    pub id: InstanceId,
    pub position: Vec3,
    pub angle: f32,
    /// Terrain height sampled under `position` at capture time
    pub terrain_height: f32,
    /// Present only for segment snapshots
    pub segment: Option<SegmentState>,
}

impl InstanceState {
    /// Capture the current state of `id`, or `None` if it is no longer valid
    pub fn capture(world: &dyn World, id: InstanceId) -> Option<InstanceState> {
        if !world.is_valid(id) {
            return None;
        }
        let position = world.position(id)?;
        let angle = world.angle(id)?;
        Some(InstanceState {
            id,
            position,
            angle,
            terrain_height: world.sample_height(position),
            segment: world.segment_ends(id).map(|(start_node, end_node)| SegmentState { start_node, end_node }),
        })
    }

    pub fn is_segment(&self) -> bool {
        self.id.kind.is_segment()
    }

    /// Point the snapshot at another instance, keeping the captured values
    pub fn replace_instance(&mut self, id: InstanceId) {
        self.id = id;
    }
}

/// Rigid motion of a group: rotation about the vertical axis through `pivot`,
/// followed by a translation.
#[derive(Clone, Debug, PartialEq)]
pub struct Motion {
    pub matrix: Mat4,
    pub pivot: Vec3,
    /// Vertical translation, applied directly to the captured height
    pub height_delta: f32,
    pub angle_delta: f32,
    pub follow_terrain: bool,
}

impl Motion {
    pub fn new(pivot: Vec3, move_delta: Vec3, angle_delta: f32, follow_terrain: bool) -> Self {
        let matrix = Mat4::from_rotation_translation(
            Quat::from_axis_angle(Vec3::NEG_Y, angle_delta),
            pivot + move_delta,
        );
        Self {
            matrix,
            pivot,
            height_delta: move_delta.y,
            angle_delta,
            follow_terrain,
        }
    }

    /// Position and angle a snapshot ends up at under this motion.
    ///
    /// The height is the captured height plus `height_delta`; with terrain
    /// following on, it also moves by the terrain difference between the new and
    /// the captured ground position. Returns the new state with the freshly
    /// sampled terrain height.
    pub fn apply_to(&self, state: &InstanceState, sample_height: impl Fn(Vec3) -> f32) -> InstanceState {
        let mut position = self.matrix.transform_point3(state.position - self.pivot);
        position.y = state.position.y + self.height_delta;

        let mut terrain_height = state.terrain_height;
        if self.follow_terrain {
            terrain_height = sample_height(position);
            position.y += terrain_height - state.terrain_height;
        }

        InstanceState {
            id: state.id,
            position,
            angle: state.angle + self.angle_delta,
            terrain_height,
            segment: state.segment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn state_at(position: Vec3) -> InstanceState {
        InstanceState {
            id: InstanceId::prop(1),
            position,
            angle: 0.25,
            terrain_height: 0.0,
            segment: None,
        }
    }

    #[test]
    fn test_quarter_turn_about_pivot() {
        let motion = Motion::new(Vec3::new(10.0, 0.0, 10.0), Vec3::ZERO, FRAC_PI_2, false);
        let moved = motion.apply_to(&state_at(Vec3::new(11.0, 2.0, 10.0)), |_| 0.0);
        assert!((moved.position - Vec3::new(10.0, 2.0, 11.0)).length() < 1e-4, "got {:?}", moved.position);
        assert!((moved.angle - (0.25 + FRAC_PI_2)).abs() < 1e-6);
    }

    #[test]
    fn test_height_delta_is_not_rotated() {
        let motion = Motion::new(Vec3::ZERO, Vec3::new(3.0, 1.5, -2.0), 0.0, false);
        let moved = motion.apply_to(&state_at(Vec3::new(1.0, 4.0, 1.0)), |_| 0.0);
        assert!((moved.position - Vec3::new(4.0, 5.5, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_follow_terrain_tracks_slope() {
        let motion = Motion::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 0.0, true);
        let mut start = state_at(Vec3::new(0.0, 7.0, 0.0));
        start.terrain_height = 5.0;
        let moved = motion.apply_to(&start, |p| 5.0 + p.x * 0.5);
        assert!((moved.terrain_height - 10.0).abs() < 1e-5);
        assert!((moved.position.y - 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_kind_queries() {
        assert!(InstanceKind::Prop.bears_heading());
        assert!(!InstanceKind::Tree.bears_heading());
        assert!(InstanceKind::Node.is_network());
        assert!(InstanceKind::Segment.is_segment());
        assert!(!InstanceKind::Node.is_segment());
    }
}
