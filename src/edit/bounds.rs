//! Axis-aligned bounding volume in world space

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned box. `min` is component-wise below `max` for well-formed bounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self { min: center - half, max: center + half }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow to include `other`
    pub fn encapsulate(&mut self, other: &Bounds) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn union(mut self, other: &Bounds) -> Bounds {
        self.encapsulate(other);
        self
    }

    /// Grow the total size by `amount` on every axis (half on each side)
    pub fn expand(&mut self, amount: f32) {
        let half = Vec3::splat(amount * 0.5);
        self.min -= half;
        self.max += half;
    }

    pub fn expanded(mut self, amount: f32) -> Bounds {
        self.expand(amount);
        self
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Finite and not inverted on any axis
    pub fn is_well_formed(&self) -> bool {
        self.is_finite() && self.min.cmple(self.max).all()
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        self.min.cmple(other.min).all() && self.max.cmpge(other.max).all()
    }

    /// Footprint on the ground plane as `[min_x, min_z, max_x, max_z]`
    pub fn footprint(&self) -> [f32; 4] {
        [self.min.x, self.min.z, self.max.x, self.max.z]
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Center: ({:.2}, {:.2}, {:.2}), Extents: ({:.2}, {:.2}, {:.2})",
            self.center().x,
            self.center().y,
            self.center().z,
            self.size().x * 0.5,
            self.size().y * 0.5,
            self.size().z * 0.5
        )
    }
}
