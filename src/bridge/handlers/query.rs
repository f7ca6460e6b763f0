//! Query handlers: QuerySelection

use serde::Serialize;

use crate::bridge::protocol::{error_codes, ErrorResponse, Response};
use crate::bridge::state::BridgeState;
use crate::bridge::util::vec3_json;
use crate::edit::{self, InstanceId, World};

/// Current placement of one selected instance
#[derive(Serialize)]
struct SelectedInstance {
    id: InstanceId,
    position: Option<[f32; 3]>,
    display_position: Option<[f32; 3]>,
    angle: Option<f32>,
    is_virtual: bool,
}

/// Handle QuerySelection - pivot, mean heading, bounds, and farthest pair of
/// the current selection
pub fn handle_query_selection(state: &BridgeState, id: Option<serde_json::Value>) -> Response {
    let world = &state.world;
    let selection = &state.selection;

    let instances: Vec<SelectedInstance> = selection
        .iter()
        .map(|instance| SelectedInstance {
            id: instance,
            position: world.position(instance).map(|p| p.to_array()),
            display_position: world.display_position(instance).map(|p| p.to_array()),
            angle: world.angle(instance),
            is_virtual: world.is_virtual(instance),
        })
        .collect();

    // Reported inside a successful response
    let (farthest, farthest_error) = match edit::farthest_pair(world, selection) {
        Ok((a, b)) => (Some([a, b]), None),
        Err(e) => (
            None,
            Some(ErrorResponse { code: error_codes::INSUFFICIENT_SELECTION, message: e.to_string() }),
        ),
    };

    Response::success(id, serde_json::json!({
        "status": "ok",
        "count": selection.len(),
        "center": edit::center(world, selection).map(vec3_json),
        "mean_heading": edit::mean_heading(world, selection),
        "total_bounds": edit::total_bounds(world, selection, false, false),
        "farthest_pair": farthest,
        "farthest_pair_error": farthest_error,
        "instances": instances,
        "pending_regions": state.tracker.pending().len(),
    }))
}
