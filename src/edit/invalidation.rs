//! Dirty-region tracking for edited world areas
//!
//! Expensive subsystems (terrain, zoning, vegetation, utility grids, render
//! tiles) are told about a changed area right away on a full mark. The general
//! area refresh is deferred: marks are queued as [`PendingRegion`]s and flushed
//! together once no new mark has arrived for `flush_delay_frames` ticks, so a
//! multi-frame drag costs one refresh instead of one per frame.

use serde::Serialize;

use super::bounds::Bounds;
use super::config::WorldGridConfig;
use super::error::InvalidationError;
use super::world::WorldSubsystems;

/// A queued area refresh
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PendingRegion {
    pub bounds: Bounds,
    pub frames_remaining: u32,
}

/// Accumulates dirty regions and flushes them on [`InvalidationTracker::tick`]
#[derive(Clone, Debug)]
pub struct InvalidationTracker {
    grid: WorldGridConfig,
    pending: Vec<PendingRegion>,
}

impl InvalidationTracker {
    pub fn new(grid: WorldGridConfig) -> Self {
        Self { grid, pending: Vec::new() }
    }

    pub fn grid(&self) -> &WorldGridConfig {
        &self.grid
    }

    pub fn pending(&self) -> &[PendingRegion] {
        &self.pending
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Mark `bounds` dirty. A `full` mark also updates terrain, zoning,
    /// vegetation, utility grids and render tiles immediately.
    ///
    /// Non-finite or inverted bounds are rejected before anything is touched.
    pub fn mark_dirty(
        &mut self,
        bounds: Bounds,
        full: bool,
        subsystems: &mut dyn WorldSubsystems,
    ) -> Result<(), InvalidationError> {
        if !bounds.is_well_formed() {
            return Err(InvalidationError::InvalidBounds { bounds });
        }

        if full {
            subsystems.update_terrain(bounds.footprint());
        }

        let mut area = bounds.expanded(self.grid.area_margin);
        self.enqueue(area);

        if full {
            subsystems.update_zoning(area.footprint());
            subsystems.update_vegetation(area.footprint());
            area.expand(self.grid.grid_margin);
            subsystems.update_utility_grids(area.footprint());
            self.mark_render_tiles(&area, subsystems);
        }

        Ok(())
    }

    /// Queue a region and restart the countdown of everything pending
    fn enqueue(&mut self, bounds: Bounds) {
        let delay = self.grid.flush_delay_frames;
        for region in &mut self.pending {
            region.frames_remaining = delay;
        }
        self.pending.push(PendingRegion { bounds, frames_remaining: delay });
    }

    /// Advance one frame. Flushes every pending region once the countdown has
    /// elapsed and returns how many were flushed.
    pub fn tick(&mut self, subsystems: &mut dyn WorldSubsystems) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        for region in &mut self.pending {
            region.frames_remaining = region.frames_remaining.saturating_sub(1);
        }

        if self.pending.iter().any(|r| r.frames_remaining > 0) {
            return 0;
        }

        let flushed = self.pending.len();
        for region in self.pending.drain(..) {
            subsystems.refresh_area(&region.bounds);
        }
        log::debug!("[Invalidation] Flushed {} pending regions", flushed);
        flushed
    }

    /// Render tile indices overlapping `bounds`, with one extra tile on the low
    /// side of each axis, clamped to the tile grid
    pub fn render_tiles(&self, bounds: &Bounds) -> Vec<usize> {
        let tiles = self.grid.tiles_per_axis;
        let (x0, z0) = self.tile_of(bounds.min.x, bounds.min.z);
        let (x1, z1) = self.tile_of(bounds.max.x, bounds.max.z);

        let x_range = (x0 - 1).max(0)..(x1 + 1).min(tiles);
        let z_range = (z0 - 1).max(0)..(z1 + 1).min(tiles);

        let mut indices = Vec::new();
        for z in z_range {
            for x in x_range.clone() {
                indices.push((z * tiles + x) as usize);
            }
        }
        indices
    }

    fn tile_of(&self, x: f32, z: f32) -> (i32, i32) {
        let cells = self.grid.cells_per_axis;
        let half = cells as f32 / 2.0;
        let cell = |v: f32| ((v / self.grid.cell_size + half) as i32).clamp(0, cells - 1);
        (
            cell(x) * self.grid.tiles_per_axis / cells,
            cell(z) * self.grid.tiles_per_axis / cells,
        )
    }

    fn mark_render_tiles(&self, bounds: &Bounds, subsystems: &mut dyn WorldSubsystems) {
        let group_count = subsystems.render_group_count();
        for index in self.render_tiles(bounds) {
            if index >= group_count {
                continue;
            }
            subsystems.mark_render_group_dirty(index);
        }
    }
}
