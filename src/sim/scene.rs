//! JSON scene description for the simulated world

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::edit::InstanceKind;

/// Planar terrain: `base + slope_x * x + slope_z * z`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimTerrain {
    pub base: f32,
    pub slope_x: f32,
    pub slope_z: f32,
}

impl SimTerrain {
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        self.base + self.slope_x * x + self.slope_z * z
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneObject {
    pub kind: InstanceKind,
    pub raw: u32,
    pub position: [f32; 3],
    #[serde(default)]
    pub angle: f32,
    #[serde(default = "default_size")]
    pub size: [f32; 3],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SceneSegment {
    pub raw: u32,
    pub start_node: u32,
    pub end_node: u32,
    #[serde(default = "default_width")]
    pub width: f32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimScene {
    #[serde(default)]
    pub terrain: SimTerrain,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub segments: Vec<SceneSegment>,
}

fn default_size() -> [f32; 3] {
    [2.0, 2.0, 2.0]
}

fn default_width() -> f32 {
    8.0
}

impl SimScene {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse scene {}", path.display()))
    }
}
