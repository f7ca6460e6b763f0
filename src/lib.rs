//! Transform and undo engine for placed world objects
//!
//! - `edit` - Selection, snapshots, the transform action, history, and area invalidation
//! - `sim` - In-memory world implementing the host traits
//! - `bridge` - Line-delimited JSON-RPC front end driving the engine over stdio

pub mod bridge;
pub mod edit;
pub mod sim;
