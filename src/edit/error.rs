//! Error types surfaced by the edit engine

use super::bounds::Bounds;
use thiserror::Error;

/// Errors returned to the caller of a selection query
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    /// Farthest-pair search needs at least two positioned, non-segment instances
    #[error("less than 2 objects selected ({eligible} eligible)")]
    InsufficientSelection { eligible: usize },
}

/// Errors returned by the invalidation tracker. Callers log and drop these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidationError {
    #[error("invalid bounds for area update: {bounds}")]
    InvalidBounds { bounds: Bounds },
}
