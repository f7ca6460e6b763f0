//! Handler module declarations and request dispatch

pub mod history;
pub mod query;
pub mod scene;
pub mod selection;
pub mod transform;

pub use history::*;
pub use query::*;
pub use scene::*;
pub use selection::*;
pub use transform::*;

use super::protocol::{error_codes, Request, Response};
use super::state::BridgeState;

/// Route one request to its handler
pub fn dispatch(state: &mut BridgeState, request: Request) -> Response {
    let Request { id, method, params } = request;
    match method.as_str() {
        "LoadScene" => handle_load_scene(state, id, params),
        "Select" => handle_select(state, id, params),
        "BoxSelect" => handle_box_select(state, id, params),
        "ClearSelection" => handle_clear_selection(state, id),
        "StartTransform" => handle_start_transform(state, id, params),
        "TransformPreview" => handle_transform_preview(state, id, params),
        "SetVirtual" => handle_set_virtual(state, id, params),
        "ApplyTransform" => handle_apply_transform(state, id),
        "CancelTransform" => handle_cancel_transform(state, id),
        "Undo" => handle_undo(state, id),
        "Redo" => handle_redo(state, id),
        "Tick" => handle_tick(state, id, params),
        "QuerySelection" => handle_query_selection(state, id),
        _ => Response::error(
            id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        ),
    }
}

/// Parse and dispatch one line of input
pub fn handle_line(state: &mut BridgeState, line: &str) -> Response {
    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return Response::error(None, error_codes::PARSE_ERROR, format!("Failed to parse request: {}", e))
        }
    };

    let id = value.get("id").cloned();
    match serde_json::from_value::<Request>(value) {
        Ok(request) => dispatch(state, request),
        Err(e) => Response::error(id, error_codes::INVALID_REQUEST, format!("Invalid request: {}", e)),
    }
}
