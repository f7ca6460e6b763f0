//! Transform and undo engine for placed world objects
//!
//! # Submodules
//! - `bounds` - Axis-aligned world bounds
//! - `instance` - Instance ids, snapshots, and the rigid motion applied to them
//! - `world` - Host capabilities the engine consumes
//! - `selection` - The selected instance set
//! - `geometry` - Pivot, total bounds, mean heading, farthest pair
//! - `invalidation` - Deferred, coalesced dirty-region tracking
//! - `action` - Undoable command contract and its context
//! - `transform` - Group move/rotate action
//! - `history` - Undo/redo stacks
//! - `config` - Engine and world grid configuration
//! - `error` - Error types

mod action;
mod bounds;
mod config;
mod error;
mod geometry;
mod history;
mod instance;
mod invalidation;
mod selection;
mod transform;
mod world;

pub use action::{Action, ActionContext, Modifiers, OverlaySink, Rgba};
pub use bounds::Bounds;
pub use config::{EngineConfig, WorldGridConfig};
pub use error::{EditError, InvalidationError};
pub use geometry::{center, farthest_pair, mean_heading, total_bounds};
pub use history::ActionHistory;
pub use instance::{InstanceId, InstanceKind, InstanceState, Motion, SegmentState};
pub use invalidation::{InvalidationTracker, PendingRegion};
pub use selection::Selection;
pub use transform::TransformAction;
pub use world::{World, WorldSubsystems};
