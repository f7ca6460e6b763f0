//! Engine configuration
//!
//! Every tunable of the edit engine lives here, including the host's world grid
//! constants used by render tile invalidation. Values can be loaded from a JSON
//! file; missing fields fall back to the defaults.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World grid constants used by the invalidation tracker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGridConfig {
    /// Margin added to every dirty region to cover visual overhang
    pub area_margin: f32,
    /// Extra margin for effects that spread over the utility grids
    pub grid_margin: f32,
    /// Frames between the last mark and the deferred flush
    pub flush_delay_frames: u32,
    /// World units per grid cell
    pub cell_size: f32,
    /// Grid cells along one axis, centred on the world origin
    pub cells_per_axis: i32,
    /// Render tiles along one axis
    pub tiles_per_axis: i32,
}

impl Default for WorldGridConfig {
    fn default() -> Self {
        Self {
            area_margin: 32.0,
            grid_margin: 64.0,
            flush_delay_frames: 60,
            cell_size: 64.0,
            cells_per_axis: 270,
            tiles_per_axis: 45,
        }
    }
}

/// Top-level engine configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Selections above this count cannot use preview-only dragging and always
    /// take the cheap invalidation path
    pub max_virtual_selection_size: usize,
    /// Oldest actions are dropped beyond this history depth
    pub max_undo_depth: usize,
    pub grid: WorldGridConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_virtual_selection_size: 1000,
            max_undo_depth: 100,
            grid: WorldGridConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        anyhow::ensure!(config.grid.cells_per_axis > 0, "grid.cells_per_axis must be positive");
        anyhow::ensure!(config.grid.tiles_per_axis > 0, "grid.tiles_per_axis must be positive");
        anyhow::ensure!(config.grid.cell_size > 0.0, "grid.cell_size must be positive");
        Ok(config)
    }
}
