//! Reference host world
//!
//! A small in-memory implementation of the host traits. The bridge server runs
//! on it and the tests use it to observe what the engine asks of the world.
//!
//! # Submodules
//! - `world` - `SimWorld` and the recorded subsystem calls
//! - `scene` - JSON scene loading
//! - `spatial` - R-tree index for area selection

mod scene;
mod spatial;
mod world;

pub use scene::{SceneObject, SceneSegment, SimScene, SimTerrain};
pub use spatial::IndexedInstance;
pub use world::{JournalEntry, SimWorld, SubsystemLog};
