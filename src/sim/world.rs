//! In-memory world used by the bridge server and by tests
//!
//! Objects keep an authoritative transform and a display transform. In
//! visual-only mode a transform moves the display copy only. Segments take their
//! heading and extent from their end nodes and are carried along whenever one
//! of those nodes moves, so they must be processed after the nodes they connect.

use glam::Vec3;
use indexmap::IndexMap;
use rstar::RTree;
use std::collections::BTreeSet;

use super::scene::{SimScene, SimTerrain};
use super::spatial::{query_area, query_point, IndexedInstance};
use crate::edit::{Bounds, InstanceId, InstanceKind, InstanceState, Motion, World, WorldSubsystems};

/// Render groups on the default 45x45 tile grid
const DEFAULT_RENDER_GROUPS: usize = 45 * 45;

#[derive(Clone, Debug)]
struct SegmentLink {
    start_node: InstanceId,
    end_node: InstanceId,
    width: f32,
    curve_fitted: bool,
}

#[derive(Clone, Debug)]
struct SimObject {
    position: Vec3,
    angle: f32,
    size: Vec3,
    display_position: Vec3,
    display_angle: f32,
    is_virtual: bool,
    deleted: bool,
    segment: Option<SegmentLink>,
}

impl SimObject {
    fn new(position: Vec3, angle: f32, size: Vec3) -> Self {
        Self {
            position,
            angle,
            size,
            display_position: position,
            display_angle: angle,
            is_virtual: false,
            deleted: false,
            segment: None,
        }
    }
}

/// World call recorded for ordering checks
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JournalEntry {
    Transform(InstanceId),
    Load(InstanceId),
    AutoCurve(InstanceId),
    DragStarted(InstanceId),
    DragFinished(InstanceId),
}

/// Every call the invalidation tracker made
#[derive(Clone, Debug)]
pub struct SubsystemLog {
    pub terrain: Vec<[f32; 4]>,
    pub zoning: Vec<[f32; 4]>,
    pub vegetation: Vec<[f32; 4]>,
    pub utility_grids: Vec<[f32; 4]>,
    pub dirty_groups: BTreeSet<usize>,
    pub refreshed: Vec<Bounds>,
    pub render_groups: usize,
}

impl Default for SubsystemLog {
    fn default() -> Self {
        Self {
            terrain: Vec::new(),
            zoning: Vec::new(),
            vegetation: Vec::new(),
            utility_grids: Vec::new(),
            dirty_groups: BTreeSet::new(),
            refreshed: Vec::new(),
            render_groups: DEFAULT_RENDER_GROUPS,
        }
    }
}

impl SubsystemLog {
    pub fn clear(&mut self) {
        *self = SubsystemLog {
            render_groups: self.render_groups,
            ..Default::default()
        };
    }
}

impl WorldSubsystems for SubsystemLog {
    fn update_terrain(&mut self, area: [f32; 4]) {
        self.terrain.push(area);
    }

    fn update_zoning(&mut self, area: [f32; 4]) {
        self.zoning.push(area);
    }

    fn update_vegetation(&mut self, area: [f32; 4]) {
        self.vegetation.push(area);
    }

    fn update_utility_grids(&mut self, area: [f32; 4]) {
        self.utility_grids.push(area);
    }

    fn render_group_count(&self) -> usize {
        self.render_groups
    }

    fn mark_render_group_dirty(&mut self, index: usize) {
        self.dirty_groups.insert(index);
    }

    fn refresh_area(&mut self, bounds: &Bounds) {
        self.refreshed.push(*bounds);
    }
}

/// Simulated host world
pub struct SimWorld {
    objects: IndexMap<InstanceId, SimObject>,
    terrain: SimTerrain,
    subsystems: SubsystemLog,
    journal: Vec<JournalEntry>,
    spatial_index: RTree<IndexedInstance>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self {
            objects: IndexMap::new(),
            terrain: SimTerrain::default(),
            subsystems: SubsystemLog::default(),
            journal: Vec::new(),
            spatial_index: RTree::new(),
        }
    }

    pub fn with_terrain(terrain: SimTerrain) -> Self {
        Self { terrain, ..Self::new() }
    }

    pub fn from_scene(scene: &SimScene) -> anyhow::Result<Self> {
        let mut world = Self::with_terrain(scene.terrain);
        for object in &scene.objects {
            anyhow::ensure!(
                !object.kind.is_segment(),
                "segment {} must be declared in the segments list",
                object.raw
            );
            world.add_object(
                InstanceId::new(object.kind, object.raw),
                Vec3::from_array(object.position),
                object.angle,
                Vec3::from_array(object.size),
            );
        }
        for segment in &scene.segments {
            world.add_segment(
                segment.raw,
                InstanceId::node(segment.start_node),
                InstanceId::node(segment.end_node),
                segment.width,
            )?;
        }
        world.rebuild_spatial_index();
        Ok(world)
    }

    pub fn add_object(&mut self, id: InstanceId, position: Vec3, angle: f32, size: Vec3) -> InstanceId {
        self.objects.insert(id, SimObject::new(position, angle, size));
        id
    }

    /// Add a straight segment between two existing nodes
    pub fn add_segment(
        &mut self,
        raw: u32,
        start_node: InstanceId,
        end_node: InstanceId,
        width: f32,
    ) -> anyhow::Result<InstanceId> {
        let start = self.live_position(start_node).ok_or_else(|| anyhow::anyhow!("unknown start node {}", start_node))?;
        let end = self.live_position(end_node).ok_or_else(|| anyhow::anyhow!("unknown end node {}", end_node))?;

        let id = InstanceId::segment(raw);
        let mut object = SimObject::new((start + end) * 0.5, heading(start, end), Vec3::splat(width));
        object.segment = Some(SegmentLink { start_node, end_node, width, curve_fitted: false });
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Delete the world object; snapshots referring to it become stale
    pub fn delete(&mut self, id: InstanceId) -> bool {
        match self.objects.get_mut(&id) {
            Some(object) if !object.deleted => {
                object.deleted = true;
                true
            }
            _ => false,
        }
    }

    pub fn ids(&self) -> Vec<InstanceId> {
        self.objects
            .iter()
            .filter(|(_, o)| !o.deleted)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn display_position(&self, id: InstanceId) -> Option<Vec3> {
        self.live(id).map(|o| o.display_position)
    }

    pub fn display_angle(&self, id: InstanceId) -> Option<f32> {
        self.live(id).map(|o| o.display_angle)
    }

    pub fn is_virtual(&self, id: InstanceId) -> bool {
        self.live(id).map(|o| o.is_virtual).unwrap_or(false)
    }

    pub fn is_curve_fitted(&self, id: InstanceId) -> bool {
        self.live(id)
            .and_then(|o| o.segment.as_ref())
            .map(|s| s.curve_fitted)
            .unwrap_or(false)
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn subsystem_log(&self) -> &SubsystemLog {
        &self.subsystems
    }

    pub fn subsystem_log_mut(&mut self) -> &mut SubsystemLog {
        &mut self.subsystems
    }

    pub fn rebuild_spatial_index(&mut self) {
        let entries: Vec<IndexedInstance> = self
            .ids()
            .into_iter()
            .filter_map(|id| self.bounds(id, false).map(|b| IndexedInstance::new(id, &b)))
            .collect();
        self.spatial_index = RTree::bulk_load(entries);
    }

    /// Instances whose footprint intersects `area`, as of the last index rebuild
    pub fn instances_in(&self, area: &Bounds) -> Vec<InstanceId> {
        query_area(&self.spatial_index, area)
    }

    pub fn instances_at(&self, x: f32, z: f32) -> Vec<InstanceId> {
        query_point(&self.spatial_index, x, z)
    }

    fn live(&self, id: InstanceId) -> Option<&SimObject> {
        self.objects.get(&id).filter(|o| !o.deleted)
    }

    fn live_position(&self, id: InstanceId) -> Option<Vec3> {
        self.live(id).map(|o| o.position)
    }

    fn placements(&self, id: InstanceId) -> Option<(Vec3, Vec3)> {
        self.live(id).map(|o| (o.position, o.display_position))
    }

    /// Carry the segments attached to `node` along after it moved from
    /// `before` (authoritative, display). Each segment shifts by half the node
    /// displacement, keeping its control point offset from the midpoint, and
    /// its heading is re-derived from the end nodes.
    fn follow_node(&mut self, node: InstanceId, before: (Vec3, Vec3)) {
        let Some(after) = self.placements(node) else {
            return;
        };
        let shift = ((after.0 - before.0) * 0.5, (after.1 - before.1) * 0.5);
        if shift.0 == Vec3::ZERO && shift.1 == Vec3::ZERO {
            return;
        }

        let attached: Vec<InstanceId> = self
            .objects
            .iter()
            .filter(|(_, o)| !o.deleted)
            .filter(|(_, o)| {
                o.segment
                    .as_ref()
                    .is_some_and(|s| s.start_node == node || s.end_node == node)
            })
            .map(|(id, _)| *id)
            .collect();

        for id in attached {
            let angle = self.segment_heading(id, false);
            let display_angle = self.segment_heading(id, true);
            if let Some(object) = self.objects.get_mut(&id) {
                object.position += shift.0;
                object.display_position += shift.1;
                object.angle = angle.unwrap_or(object.angle);
                object.display_angle = display_angle.unwrap_or(object.display_angle);
            }
        }
    }

    /// Heading of a segment from its end nodes, using display positions if the
    /// segment is being previewed
    fn segment_heading(&self, id: InstanceId, display: bool) -> Option<f32> {
        let link = self.live(id)?.segment.as_ref()?;
        let start = self.live(link.start_node)?;
        let end = self.live(link.end_node)?;
        if display {
            Some(heading(start.display_position, end.display_position))
        } else {
            Some(heading(start.position, end.position))
        }
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn heading(from: Vec3, to: Vec3) -> f32 {
    (to.z - from.z).atan2(to.x - from.x)
}

impl World for SimWorld {
    fn is_valid(&self, id: InstanceId) -> bool {
        self.live(id).is_some()
    }

    fn position(&self, id: InstanceId) -> Option<Vec3> {
        self.live_position(id)
    }

    fn angle(&self, id: InstanceId) -> Option<f32> {
        self.live(id).map(|o| o.angle)
    }

    fn bounds(&self, id: InstanceId, ignore_segments: bool) -> Option<Bounds> {
        let object = self.live(id)?;
        let Some(link) = &object.segment else {
            return Some(Bounds::from_center_size(object.position, object.size));
        };

        let start = self.live_position(link.start_node)?;
        let end = self.live_position(link.end_node)?;
        let mut bounds = Bounds::new(start.min(end), start.max(end));
        if !ignore_segments {
            bounds.encapsulate(&Bounds::new(object.position, object.position));
        }
        Some(bounds.expanded(link.width))
    }

    fn segment_ends(&self, id: InstanceId) -> Option<(InstanceId, InstanceId)> {
        self.live(id)?
            .segment
            .as_ref()
            .map(|link| (link.start_node, link.end_node))
    }

    fn sample_height(&self, position: Vec3) -> f32 {
        self.terrain.sample(position.x, position.z)
    }

    fn save_state(&self, id: InstanceId) -> Option<InstanceState> {
        InstanceState::capture(self, id)
    }

    fn load_state(&mut self, state: &InstanceState) {
        self.journal.push(JournalEntry::Load(state.id));
        let derived = self.segment_heading(state.id, false);
        let Some(before) = self.placements(state.id) else {
            return;
        };
        let Some(object) = self.objects.get_mut(&state.id) else {
            return;
        };
        object.position = state.position;
        object.angle = derived.unwrap_or(state.angle);
        object.display_position = object.position;
        object.display_angle = object.angle;

        if state.id.kind == InstanceKind::Node {
            self.follow_node(state.id, before);
        }
    }

    fn transform(&mut self, state: &InstanceState, motion: &Motion) {
        self.journal.push(JournalEntry::Transform(state.id));
        let moved = motion.apply_to(state, |p| self.terrain.sample(p.x, p.z));
        let is_virtual = self.is_virtual(state.id);
        let derived = self.segment_heading(state.id, is_virtual);

        let Some(before) = self.placements(state.id) else {
            return;
        };
        let Some(object) = self.objects.get_mut(&state.id) else {
            return;
        };
        let angle = derived.unwrap_or(moved.angle);
        object.display_position = moved.position;
        object.display_angle = angle;
        if !object.is_virtual {
            object.position = moved.position;
            object.angle = angle;
        }

        if state.id.kind == InstanceKind::Node {
            self.follow_node(state.id, before);
        }
    }

    fn set_virtual(&mut self, id: InstanceId, on: bool) {
        let Some(before) = self.placements(id) else {
            return;
        };
        if let Some(object) = self.objects.get_mut(&id) {
            object.is_virtual = on;
            if !on {
                object.display_position = object.position;
                object.display_angle = object.angle;
            }
        }
        if !on && id.kind == InstanceKind::Node {
            self.follow_node(id, before);
        }
    }

    fn auto_curve(&mut self, node: InstanceId, target: Option<InstanceId>) {
        self.journal.push(JournalEntry::AutoCurve(node));

        let connected: Vec<InstanceId> = self
            .objects
            .iter()
            .filter(|(id, o)| !o.deleted && target.map_or(true, |t| t == **id))
            .filter(|(_, o)| {
                o.segment
                    .as_ref()
                    .is_some_and(|s| s.start_node == node || s.end_node == node)
            })
            .map(|(id, _)| *id)
            .collect();

        for id in connected {
            let Some((start, end)) = self.segment_ends(id) else {
                continue;
            };
            let (Some(a), Some(b)) = (self.live_position(start), self.live_position(end)) else {
                continue;
            };
            if let Some(object) = self.objects.get_mut(&id) {
                object.position = (a + b) * 0.5;
                object.display_position = object.position;
                object.angle = heading(a, b);
                object.display_angle = object.angle;
                if let Some(link) = object.segment.as_mut() {
                    link.curve_fitted = true;
                }
            }
        }
    }

    fn drag_started(&mut self, id: InstanceId) {
        self.journal.push(JournalEntry::DragStarted(id));
    }

    fn drag_finished(&mut self, id: InstanceId) {
        self.journal.push(JournalEntry::DragFinished(id));
    }

    fn subsystems(&mut self) -> &mut dyn WorldSubsystems {
        &mut self.subsystems
    }
}
