//! JSON-RPC bridge driving the engine over line-delimited stdio
//!
//! # Module Structure
//! - `protocol` - JSON-RPC request/response types
//! - `state` - Session state: world, selection, tracker, history, active transform
//! - `util` - Parameter parsing helpers
//! - `handlers` - Request handlers organized by functionality

pub mod handlers;
pub mod protocol;
pub mod state;
pub mod util;

pub use handlers::{dispatch, handle_line};
pub use protocol::{error_codes, ErrorResponse, Request, Response};
pub use state::BridgeState;
