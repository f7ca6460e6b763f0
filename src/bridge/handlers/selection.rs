//! Selection handlers: Select, BoxSelect, ClearSelection

use glam::Vec3;
use serde::Deserialize;

use crate::bridge::protocol::{error_codes, Response};
use crate::bridge::state::BridgeState;
use crate::bridge::util::parse_params;
use crate::edit::{Bounds, InstanceId, World};

#[derive(Deserialize)]
struct SelectParams {
    ids: Vec<InstanceId>,
    /// Add to the current selection instead of replacing it
    #[serde(default)]
    append: bool,
}

#[derive(Deserialize)]
struct BoxSelectParams {
    min: [f32; 3],
    max: [f32; 3],
    #[serde(default)]
    append: bool,
}

fn reject_during_transform(state: &BridgeState, id: &Option<serde_json::Value>) -> Option<Response> {
    state.active.as_ref().map(|_| {
        Response::error(
            id.clone(),
            error_codes::TRANSFORM_IN_PROGRESS,
            "Selection is locked while a transform is active".to_string(),
        )
    })
}

/// Insert valid ids, returns how many were unknown or deleted
fn select_ids(state: &mut BridgeState, ids: impl IntoIterator<Item = InstanceId>, append: bool) -> usize {
    if !append {
        state.selection.clear();
    }
    let mut skipped = 0;
    for instance in ids {
        if state.world.is_valid(instance) {
            state.selection.insert(instance);
        } else {
            skipped += 1;
        }
    }
    skipped
}

fn selection_response(state: &BridgeState, id: Option<serde_json::Value>, skipped: usize) -> Response {
    let ids: Vec<InstanceId> = state.selection.iter().collect();
    Response::success(id, serde_json::json!({
        "status": "ok",
        "selected": ids,
        "skipped": skipped,
    }))
}

/// Handle Select - select instances by id
pub fn handle_select(
    state: &mut BridgeState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    if let Some(e) = reject_during_transform(state, &id) {
        return e;
    }
    let p: SelectParams = match parse_params(id.clone(), params, "{ids: [{kind, raw}], append?}") {
        Ok(p) => p,
        Err(e) => return e,
    };

    let skipped = select_ids(state, p.ids, p.append);
    log::debug!("[Bridge] Select: {} selected, {} skipped", state.selection.len(), skipped);
    selection_response(state, id, skipped)
}

/// Handle BoxSelect - select every instance whose footprint meets the box
pub fn handle_box_select(
    state: &mut BridgeState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    if let Some(e) = reject_during_transform(state, &id) {
        return e;
    }
    let p: BoxSelectParams = match parse_params(id.clone(), params, "{min: [x,y,z], max: [x,y,z], append?}") {
        Ok(p) => p,
        Err(e) => return e,
    };

    let area = Bounds::new(Vec3::from_array(p.min), Vec3::from_array(p.max));
    if !area.is_well_formed() {
        return Response::error(id, error_codes::INVALID_PARAMS, format!("Invalid box: {}", area));
    }

    let hits = state.world.instances_in(&area);
    let skipped = select_ids(state, hits, p.append);
    log::debug!("[Bridge] BoxSelect: {} selected", state.selection.len());
    selection_response(state, id, skipped)
}

/// Handle ClearSelection
pub fn handle_clear_selection(state: &mut BridgeState, id: Option<serde_json::Value>) -> Response {
    if let Some(e) = reject_during_transform(state, &id) {
        return e;
    }
    state.selection.clear();
    selection_response(state, id, 0)
}
