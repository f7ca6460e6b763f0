//! Selection-wide geometric queries: pivot, bounds, heading, extreme objects

use glam::Vec3;

use super::bounds::Bounds;
use super::error::EditError;
use super::instance::InstanceId;
use super::selection::Selection;
use super::world::World;

/// Centre of the union of all selected bounds. This is the rotation pivot, not
/// the mean of positions.
pub fn center(world: &dyn World, selection: &Selection) -> Option<Vec3> {
    total_bounds(world, selection, true, false).map(|b| b.center())
}

/// Union of the bounds of every valid selected instance.
///
/// `ignore_segments` is forwarded to the per-instance query; `exclude_networks`
/// leaves nodes and segments out entirely.
pub fn total_bounds(
    world: &dyn World,
    selection: &Selection,
    ignore_segments: bool,
    exclude_networks: bool,
) -> Option<Bounds> {
    let mut total: Option<Bounds> = None;

    for id in selection.iter() {
        if exclude_networks && id.kind.is_network() {
            continue;
        }
        let Some(bounds) = world.bounds(id, ignore_segments) else {
            continue;
        };
        match total.as_mut() {
            Some(t) => t.encapsulate(&bounds),
            None => total = Some(bounds),
        }
    }

    total
}

/// Circular mean of the headings of buildings, procedural objects and props.
///
/// The arithmetic mean breaks across the 0/2π seam; averaging unit vectors does
/// not. Returns 0 when nothing in the selection has a heading.
pub fn mean_heading(world: &dyn World, selection: &Selection) -> f32 {
    let angles: Vec<f32> = selection
        .iter()
        .filter(|id| id.kind.bears_heading())
        .filter_map(|id| world.angle(id))
        .map(|a| (a % std::f32::consts::TAU).to_degrees())
        .collect();

    mean_angle_degrees(&angles).to_radians()
}

/// Circular mean of angles given in degrees, result in degrees
fn mean_angle_degrees(angles: &[f32]) -> f32 {
    if angles.is_empty() {
        return 0.0;
    }
    let count = angles.len() as f32;
    let x = angles.iter().map(|a| a.to_radians().cos()).sum::<f32>() / count;
    let y = angles.iter().map(|a| a.to_radians().sin()).sum::<f32>() / count;
    y.atan2(x).to_degrees()
}

/// The two selected instances farthest apart, used to place rotation handles.
///
/// Segments have no single position and are skipped. Ties keep the pair found
/// first in selection order.
pub fn farthest_pair(world: &dyn World, selection: &Selection) -> Result<(InstanceId, InstanceId), EditError> {
    let candidates: Vec<(InstanceId, Vec3)> = selection
        .iter()
        .filter(|id| !id.kind.is_segment())
        .filter_map(|id| world.position(id).map(|p| (id, p)))
        .collect();

    if candidates.len() < 2 {
        return Err(EditError::InsufficientSelection { eligible: candidates.len() });
    }

    let mut best = (candidates[0].0, candidates[1].0);
    let mut longest = 0.0f32;

    for i in 0..candidates.len() - 1 {
        for j in (i + 1)..candidates.len() {
            let distance = (candidates[i].1 - candidates[j].1).length_squared();
            if distance > longest {
                best = (candidates[i].0, candidates[j].0);
                longest = distance;
            }
        }
    }

    Ok(best)
}
