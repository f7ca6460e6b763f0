//! Transform handlers: StartTransform, TransformPreview, SetVirtual, ApplyTransform, CancelTransform
//!
//! A transform session is one [`TransformAction`] held in `BridgeState::active`.
//! Previews re-apply it from its snapshots every call; ApplyTransform commits it
//! and pushes it onto the history, CancelTransform throws it away.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bridge::protocol::{error_codes, Response};
use crate::bridge::state::BridgeState;
use crate::bridge::util::{parse_optional_params, parse_params, vec3_json};
use crate::edit::{Action, InstanceId, TransformAction};

#[derive(Default, Deserialize)]
struct StartTransformParams {
    #[serde(default)]
    follow_terrain: bool,
    #[serde(default)]
    auto_curve: bool,
    #[serde(default)]
    segment_curve: Option<InstanceId>,
    #[serde(default)]
    fast_move: bool,
    #[serde(default)]
    shift: bool,
}

#[derive(Deserialize)]
struct TransformPreviewParams {
    /// Absolute translation from the start position
    #[serde(default)]
    delta: Option<[f32; 3]>,
    /// Absolute rotation from the start angle, radians
    #[serde(default)]
    angle: Option<f32>,
    #[serde(default)]
    snap_angle: Option<f32>,
    #[serde(default)]
    follow_terrain: Option<bool>,
}

#[derive(Deserialize)]
struct SetVirtualParams {
    on: bool,
}

/// Predicted placement of one instance
#[derive(Serialize)]
struct PreviewInstance {
    id: InstanceId,
    position: [f32; 3],
    angle: f32,
}

fn no_active(id: Option<serde_json::Value>) -> Response {
    Response::error(id, error_codes::NO_ACTIVE_TRANSFORM, "No active transform".to_string())
}

/// Handle StartTransform - capture the selection and begin a drag
pub fn handle_start_transform(
    state: &mut BridgeState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let p: StartTransformParams = match parse_optional_params(
        id.clone(),
        params,
        "{follow_terrain?, auto_curve?, segment_curve?, fast_move?, shift?}",
    ) {
        Ok(p) => p,
        Err(e) => return e,
    };

    if state.active.is_some() {
        return Response::error(
            id,
            error_codes::TRANSFORM_IN_PROGRESS,
            "A transform is already active".to_string(),
        );
    }
    if state.selection.is_empty() {
        return Response::error(id, error_codes::INVALID_PARAMS, "Nothing selected".to_string());
    }

    state.modifiers.fast_move_toggle = p.fast_move;
    state.modifiers.shift = p.shift;

    let mut action = TransformAction::new(&state.world, &state.selection);
    action.follow_terrain = p.follow_terrain;
    action.auto_curve = p.auto_curve;
    action.segment_curve = p.segment_curve;

    let (mut ctx, active, _) = state.parts();
    action.initialise_drag(&mut ctx);

    log::info!(
        "[Bridge] StartTransform: {} states, pivot=({:.3}, {:.3}, {:.3})",
        action.states().len(),
        action.pivot().x,
        action.pivot().y,
        action.pivot().z
    );

    let result = serde_json::json!({
        "status": "ok",
        "state_count": action.states().len(),
        "pivot": vec3_json(action.pivot()),
        "contains_network": action.contains_network(),
    });
    *active = Some(action);

    Response::success(id, result)
}

/// Handle TransformPreview - update the deltas, re-apply, and report where
/// every instance ends up
pub fn handle_transform_preview(
    state: &mut BridgeState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let p: TransformPreviewParams = match parse_params(id.clone(), params, "{delta?, angle?, snap_angle?, follow_terrain?}") {
        Ok(p) => p,
        Err(e) => return e,
    };

    let (mut ctx, active, _) = state.parts();
    let Some(action) = active.as_mut() else {
        return no_active(id);
    };

    if let Some(delta) = p.delta {
        action.set_move(Vec3::from_array(delta));
    }
    if p.angle.is_some() || p.snap_angle.is_some() {
        action.set_rotation(p.angle.unwrap_or(action.angle_delta), p.snap_angle.unwrap_or(action.snap_angle));
    }
    if let Some(follow) = p.follow_terrain {
        action.follow_terrain = follow;
    }

    let predicted: Vec<PreviewInstance> = action
        .calculate_states(
            &*ctx.world,
            action.move_delta,
            action.angle_delta + action.snap_angle,
            action.pivot(),
            action.follow_terrain,
        )
        .into_iter()
        .map(|s| PreviewInstance { id: s.id, position: s.position.to_array(), angle: s.angle })
        .collect();

    action.apply(&mut ctx);

    Response::success(id, serde_json::json!({
        "status": "ok",
        "virtual": action.is_virtual(),
        "instances": predicted,
    }))
}

/// Handle SetVirtual - toggle preview-only mode of the active transform
pub fn handle_set_virtual(
    state: &mut BridgeState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let p: SetVirtualParams = match parse_params(id.clone(), params, "{on: bool}") {
        Ok(p) => p,
        Err(e) => return e,
    };

    let (mut ctx, active, _) = state.parts();
    let Some(action) = active.as_mut() else {
        return no_active(id);
    };

    let accepted = action.set_virtual(&mut ctx, p.on);
    log::debug!("[Bridge] SetVirtual({}): accepted={}", p.on, accepted);

    Response::success(id, serde_json::json!({
        "status": "ok",
        "accepted": accepted,
        "virtual": action.is_virtual(),
    }))
}

/// Handle ApplyTransform - commit the active transform and record it for undo
pub fn handle_apply_transform(state: &mut BridgeState, id: Option<serde_json::Value>) -> Response {
    let (mut ctx, active, history) = state.parts();
    let Some(mut action) = active.take() else {
        return no_active(id);
    };

    // Leaving virtual mode commits on its own
    if !action.is_virtual() {
        action.apply(&mut ctx);
    }
    action.finalise_drag(&mut ctx);

    let moved = action.states().len();
    let name = action.name();
    history.push(Box::new(action));
    state.world.rebuild_spatial_index();

    log::info!("[Bridge] ApplyTransform: {} states committed", moved);

    Response::success(id, serde_json::json!({
        "status": "ok",
        "action": name,
        "moved": moved,
        "can_undo": state.history.can_undo(),
    }))
}

/// Handle CancelTransform - drop the active transform, restoring the
/// captured placements if any live preview moved them
pub fn handle_cancel_transform(state: &mut BridgeState, id: Option<serde_json::Value>) -> Response {
    let (mut ctx, active, _) = state.parts();
    let Some(mut action) = active.take() else {
        return no_active(id);
    };

    let was_virtual = action.is_virtual();
    action.discard(&mut ctx);
    // Live previews, even ones made before switching to virtual, moved the
    // authoritative placements
    if action.moved_live() {
        action.undo(&mut ctx);
    }
    action.finalise_drag(&mut ctx);

    log::info!(
        "[Bridge] CancelTransform: virtual={}, restored={}",
        was_virtual,
        action.moved_live()
    );

    Response::success(id, serde_json::json!({ "status": "ok" }))
}
