//! R-tree index over instance footprints for area selection

use rstar::{RTree, RTreeObject, AABB};

use crate::edit::{Bounds, InstanceId};

/// Footprint of one instance on the ground plane
#[derive(Clone, Debug)]
pub struct IndexedInstance {
    pub id: InstanceId,
    pub footprint: AABB<[f32; 2]>,
}

impl IndexedInstance {
    pub fn new(id: InstanceId, bounds: &Bounds) -> Self {
        let [min_x, min_z, max_x, max_z] = bounds.footprint();
        Self {
            id,
            footprint: AABB::from_corners([min_x, min_z], [max_x, max_z]),
        }
    }
}

impl RTreeObject for IndexedInstance {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.footprint
    }
}

impl rstar::PointDistance for IndexedInstance {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        self.footprint.distance_2(point)
    }
}

/// Ids whose footprint intersects `area`, sorted for stable output
pub fn query_area(tree: &RTree<IndexedInstance>, area: &Bounds) -> Vec<InstanceId> {
    let [min_x, min_z, max_x, max_z] = area.footprint();
    let envelope = AABB::from_corners([min_x, min_z], [max_x, max_z]);
    let mut ids: Vec<InstanceId> = tree
        .locate_in_envelope_intersecting(&envelope)
        .map(|o| o.id)
        .collect();
    ids.sort();
    ids
}

/// Ids whose footprint contains the ground point
pub fn query_point(tree: &RTree<IndexedInstance>, x: f32, z: f32) -> Vec<InstanceId> {
    let mut ids: Vec<InstanceId> = tree.locate_all_at_point(&[x, z]).map(|o| o.id).collect();
    ids.sort();
    ids
}
