//! History handlers: Undo, Redo

use crate::bridge::protocol::{error_codes, Response};
use crate::bridge::state::BridgeState;

fn history_response(state: &BridgeState, id: Option<serde_json::Value>, action: Option<&'static str>) -> Response {
    Response::success(id, serde_json::json!({
        "status": "ok",
        "action": action,
        "can_undo": state.history.can_undo(),
        "can_redo": state.history.can_redo(),
    }))
}

fn reject_during_transform(state: &BridgeState, id: &Option<serde_json::Value>) -> Option<Response> {
    state.active.as_ref().map(|_| {
        Response::error(
            id.clone(),
            error_codes::TRANSFORM_IN_PROGRESS,
            "Finish or cancel the active transform first".to_string(),
        )
    })
}

/// Handle Undo - revert the latest committed action
pub fn handle_undo(state: &mut BridgeState, id: Option<serde_json::Value>) -> Response {
    if let Some(e) = reject_during_transform(state, &id) {
        return e;
    }

    let (mut ctx, _, history) = state.parts();
    let undone = history.undo(&mut ctx);
    if undone.is_some() {
        state.world.rebuild_spatial_index();
    }

    log::info!("[Bridge] Undo: {}", undone.unwrap_or("nothing to undo"));
    history_response(state, id, undone)
}

/// Handle Redo - re-apply the latest undone action
pub fn handle_redo(state: &mut BridgeState, id: Option<serde_json::Value>) -> Response {
    if let Some(e) = reject_during_transform(state, &id) {
        return e;
    }

    let (mut ctx, _, history) = state.parts();
    let redone = history.redo(&mut ctx);
    if redone.is_some() {
        state.world.rebuild_spatial_index();
    }

    log::info!("[Bridge] Redo: {}", redone.unwrap_or("nothing to redo"));
    history_response(state, id, redone)
}
