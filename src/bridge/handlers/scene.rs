//! Scene handlers: LoadScene, Tick

use serde::Deserialize;

use crate::bridge::protocol::{error_codes, Response};
use crate::bridge::state::BridgeState;
use crate::bridge::util::{parse_optional_params, parse_params};
use crate::edit::World;
use crate::sim::{SimScene, SimWorld};

#[derive(Deserialize)]
struct LoadSceneParams {
    #[serde(default)]
    file_path: Option<String>,
    /// Inline scene, used when no file path is given
    #[serde(default)]
    scene: Option<SimScene>,
}

#[derive(Default, Deserialize)]
struct TickParams {
    #[serde(default = "one_frame")]
    frames: u32,
}

fn one_frame() -> u32 {
    1
}

/// Handle LoadScene - replace the world, dropping selection and history
pub fn handle_load_scene(
    state: &mut BridgeState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let p: LoadSceneParams = match parse_params(id.clone(), params, "{file_path} or {scene}") {
        Ok(p) => p,
        Err(e) => return e,
    };

    let scene = match (p.file_path.as_deref(), p.scene) {
        (Some(path), _) => match SimScene::load(path) {
            Ok(scene) => scene,
            Err(e) => return Response::error(id, error_codes::LOAD_FAILED, format!("{:#}", e)),
        },
        (None, Some(scene)) => scene,
        (None, None) => {
            return Response::error(id, error_codes::INVALID_PARAMS, "No scene specified".to_string())
        }
    };

    let world = match SimWorld::from_scene(&scene) {
        Ok(world) => world,
        Err(e) => return Response::error(id, error_codes::LOAD_FAILED, format!("{:#}", e)),
    };

    let instance_count = world.ids().len();
    state.reset(world);
    state.scene_path = p.file_path;

    log::info!(
        "[Bridge] Loaded scene {}: {} instances",
        state.scene_path.as_deref().unwrap_or("<inline>"),
        instance_count
    );

    Response::success(id, serde_json::json!({
        "status": "ok",
        "instance_count": instance_count,
    }))
}

/// Handle Tick - advance the invalidation countdown by some frames
pub fn handle_tick(
    state: &mut BridgeState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let p: TickParams = match parse_optional_params(id.clone(), params, "{frames?}") {
        Ok(p) => p,
        Err(e) => return e,
    };
    let frames = if p.frames == 0 { 1 } else { p.frames };

    let mut flushed = 0;
    for _ in 0..frames {
        flushed += state.tracker.tick(state.world.subsystems());
    }

    Response::success(id, serde_json::json!({
        "status": "ok",
        "flushed": flushed,
        "pending": state.tracker.pending(),
    }))
}
