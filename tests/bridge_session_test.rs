// JSON-RPC round trips through the bridge dispatcher
use moveit_core::bridge::{error_codes, handle_line, BridgeState, Response};
use moveit_core::edit::{EngineConfig, InstanceId, World};
use serde_json::{json, Value};

#[cfg(test)]
mod tests {
    use super::*;

    fn call(state: &mut BridgeState, method: &str, params: Value) -> Response {
        let line = json!({"id": 1, "method": method, "params": params}).to_string();
        handle_line(state, &line)
    }

    fn ok(state: &mut BridgeState, method: &str, params: Value) -> Value {
        let response = call(state, method, params);
        assert!(!response.is_error(), "{} failed: {:?}", method, response.error);
        response.result.expect("result")
    }

    fn error_code(response: &Response) -> i32 {
        response.error.as_ref().map(|e| e.code).expect("error response")
    }

    fn scene() -> Value {
        json!({
            "terrain": {"base": 1.0, "slope_x": 0.0, "slope_z": 0.0},
            "objects": [
                {"kind": "Building", "raw": 1, "position": [10.0, 1.0, 0.0], "angle": 0.5, "size": [8.0, 10.0, 8.0]},
                {"kind": "Prop", "raw": 2, "position": [-10.0, 1.0, 0.0]},
                {"kind": "Node", "raw": 3, "position": [0.0, 1.0, 30.0]},
                {"kind": "Node", "raw": 4, "position": [0.0, 1.0, 60.0]}
            ],
            "segments": [{"raw": 5, "start_node": 3, "end_node": 4}]
        })
    }

    fn loaded(config: EngineConfig) -> BridgeState {
        let mut state = BridgeState::new(config);
        let result = ok(&mut state, "LoadScene", json!({"scene": scene()}));
        assert_eq!(result["instance_count"], 5);
        state
    }

    #[test]
    fn test_move_apply_undo_redo() {
        let mut state = loaded(EngineConfig::default());
        ok(&mut state, "Select", json!({"ids": [{"kind": "Building", "raw": 1}, {"kind": "Prop", "raw": 2}]}));

        let started = ok(&mut state, "StartTransform", json!({}));
        assert_eq!(started["state_count"], 2);
        assert_eq!(started["pivot"], json!([1.5, 1.0, 0.0]));

        let preview = ok(&mut state, "TransformPreview", json!({"delta": [0.0, 0.0, 5.0]}));
        assert_eq!(preview["instances"][0]["position"], json!([10.0, 1.0, 5.0]));

        let applied = ok(&mut state, "ApplyTransform", Value::Null);
        assert_eq!(applied["can_undo"], true);
        assert_eq!(state.world.position(InstanceId::building(1)).unwrap().z, 5.0);

        let undone = ok(&mut state, "Undo", Value::Null);
        assert_eq!(undone["action"], "Transform");
        assert_eq!(undone["can_redo"], true);
        assert_eq!(state.world.position(InstanceId::building(1)).unwrap().z, 0.0);

        ok(&mut state, "Redo", Value::Null);
        assert_eq!(state.world.position(InstanceId::prop(2)).unwrap().z, 5.0);
    }

    #[test]
    fn test_virtual_preview_then_cancel() {
        let mut state = loaded(EngineConfig::default());
        ok(&mut state, "Select", json!({"ids": [{"kind": "Building", "raw": 1}]}));
        ok(&mut state, "StartTransform", Value::Null);

        let toggled = ok(&mut state, "SetVirtual", json!({"on": true}));
        assert_eq!(toggled["accepted"], true);
        ok(&mut state, "TransformPreview", json!({"delta": [3.0, 0.0, 0.0], "angle": 1.0}));

        let query = ok(&mut state, "QuerySelection", Value::Null);
        assert_eq!(query["instances"][0]["position"], json!([10.0, 1.0, 0.0]));
        assert_eq!(query["instances"][0]["display_position"], json!([13.0, 1.0, 0.0]));
        assert_eq!(query["instances"][0]["is_virtual"], true);

        ok(&mut state, "CancelTransform", Value::Null);
        let building = InstanceId::building(1);
        assert_eq!(state.world.position(building).unwrap().x, 10.0);
        assert_eq!(state.world.display_position(building).unwrap().x, 10.0);
        assert!(!state.world.is_virtual(building));
        assert!(!state.history.can_undo());
    }

    #[test]
    fn test_live_preview_cancel_restores_placement() {
        let mut state = loaded(EngineConfig::default());
        ok(&mut state, "Select", json!({"ids": [{"kind": "Prop", "raw": 2}]}));
        ok(&mut state, "StartTransform", Value::Null);
        ok(&mut state, "TransformPreview", json!({"delta": [0.0, 0.0, -7.0]}));
        assert_eq!(state.world.position(InstanceId::prop(2)).unwrap().z, -7.0);

        ok(&mut state, "CancelTransform", Value::Null);
        assert_eq!(state.world.position(InstanceId::prop(2)).unwrap().z, 0.0);
    }

    #[test]
    fn test_cancel_after_live_then_virtual_preview_restores_placement() {
        let mut state = loaded(EngineConfig::default());
        ok(&mut state, "Select", json!({"ids": [{"kind": "Prop", "raw": 2}]}));
        ok(&mut state, "StartTransform", Value::Null);
        ok(&mut state, "TransformPreview", json!({"delta": [0.0, 0.0, -7.0]}));

        let toggled = ok(&mut state, "SetVirtual", json!({"on": true}));
        assert_eq!(toggled["accepted"], true);
        ok(&mut state, "TransformPreview", json!({"delta": [0.0, 0.0, -9.0]}));

        ok(&mut state, "CancelTransform", Value::Null);
        let prop = InstanceId::prop(2);
        assert_eq!(state.world.position(prop).unwrap().z, 0.0);
        assert_eq!(state.world.display_position(prop).unwrap().z, 0.0);
        assert!(!state.world.is_virtual(prop));
    }

    #[test]
    fn test_virtual_refused_for_large_selection() {
        let config = EngineConfig { max_virtual_selection_size: 2, ..EngineConfig::default() };
        let mut state = loaded(config);
        ok(&mut state, "BoxSelect", json!({"min": [-100.0, -10.0, -100.0], "max": [100.0, 10.0, 100.0]}));
        ok(&mut state, "StartTransform", Value::Null);

        let toggled = ok(&mut state, "SetVirtual", json!({"on": true}));
        assert_eq!(toggled["accepted"], false);
        assert_eq!(toggled["virtual"], false);
    }

    #[test]
    fn test_box_select_uses_footprints() {
        let mut state = loaded(EngineConfig::default());
        let result = ok(&mut state, "BoxSelect", json!({"min": [5.0, 0.0, -1.0], "max": [15.0, 0.0, 1.0]}));
        assert_eq!(result["selected"], json!([{"kind": "Building", "raw": 1}]));
    }

    #[test]
    fn test_query_selection_reports_geometry() {
        let mut state = loaded(EngineConfig::default());
        ok(&mut state, "Select", json!({"ids": [{"kind": "Building", "raw": 1}, {"kind": "Prop", "raw": 2}]}));

        let query = ok(&mut state, "QuerySelection", Value::Null);
        assert_eq!(query["count"], 2);
        assert_eq!(query["center"], json!([1.5, 1.0, 0.0]));
        assert_eq!(
            query["farthest_pair"],
            json!([{"kind": "Building", "raw": 1}, {"kind": "Prop", "raw": 2}])
        );

        ok(&mut state, "Select", json!({"ids": [{"kind": "Prop", "raw": 2}]}));
        let query = ok(&mut state, "QuerySelection", Value::Null);
        assert!(query["farthest_pair"].is_null());
        let failure = &query["farthest_pair_error"];
        assert_eq!(failure["code"], error_codes::INSUFFICIENT_SELECTION);
        assert!(failure["message"].as_str().unwrap().contains("1 eligible"));
    }

    #[test]
    fn test_tick_flushes_after_delay() {
        let mut state = loaded(EngineConfig::default());
        ok(&mut state, "Select", json!({"ids": [{"kind": "Prop", "raw": 2}]}));
        ok(&mut state, "StartTransform", Value::Null);
        ok(&mut state, "ApplyTransform", Value::Null);

        let early = ok(&mut state, "Tick", json!({"frames": 10}));
        assert_eq!(early["flushed"], 0);
        let late = ok(&mut state, "Tick", json!({"frames": 50}));
        assert_eq!(late["flushed"], 2);
        assert_eq!(late["pending"], json!([]));
    }

    #[test]
    fn test_error_codes() {
        let mut state = BridgeState::default();
        assert_eq!(error_code(&call(&mut state, "Frobnicate", Value::Null)), error_codes::METHOD_NOT_FOUND);
        assert_eq!(error_code(&handle_line(&mut state, "{not json")), error_codes::PARSE_ERROR);
        let missing_method = handle_line(&mut state, r#"{"id": 7, "params": {}}"#);
        assert_eq!(error_code(&missing_method), error_codes::INVALID_REQUEST);
        assert_eq!(missing_method.id, Some(json!(7)));
        assert_eq!(error_code(&call(&mut state, "ApplyTransform", Value::Null)), error_codes::NO_ACTIVE_TRANSFORM);
        assert_eq!(error_code(&call(&mut state, "StartTransform", Value::Null)), error_codes::INVALID_PARAMS);
        assert_eq!(error_code(&call(&mut state, "SetVirtual", json!({}))), error_codes::INVALID_PARAMS);

        let mut state = loaded(EngineConfig::default());
        ok(&mut state, "Select", json!({"ids": [{"kind": "Prop", "raw": 2}]}));
        ok(&mut state, "StartTransform", Value::Null);
        assert_eq!(
            error_code(&call(&mut state, "Select", json!({"ids": []}))),
            error_codes::TRANSFORM_IN_PROGRESS
        );
        assert_eq!(error_code(&call(&mut state, "Undo", Value::Null)), error_codes::TRANSFORM_IN_PROGRESS);
    }

    #[test]
    fn test_select_skips_unknown_ids() {
        let mut state = loaded(EngineConfig::default());
        let result = ok(
            &mut state,
            "Select",
            json!({"ids": [{"kind": "Prop", "raw": 2}, {"kind": "Tree", "raw": 99}]}),
        );
        assert_eq!(result["skipped"], 1);
        assert_eq!(state.selection.len(), 1);
    }
}
