//! Parameter helpers shared by the handlers

use serde::de::DeserializeOwned;

use super::protocol::{error_codes, Response};

/// Deserialize request params, or build the INVALID_PARAMS response naming the
/// expected shape
pub fn parse_params<T: DeserializeOwned>(
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
    expected: &str,
) -> Result<T, Response> {
    let value = params.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(|e| {
        Response::error(
            id,
            error_codes::INVALID_PARAMS,
            format!("Invalid params: expected {} ({})", expected, e),
        )
    })
}

/// Like [`parse_params`] but missing params fall back to `T::default()`
pub fn parse_optional_params<T: DeserializeOwned + Default>(
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
    expected: &str,
) -> Result<T, Response> {
    match params {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        some => parse_params(id, some, expected),
    }
}

pub fn vec3_json(v: glam::Vec3) -> serde_json::Value {
    serde_json::json!([v.x, v.y, v.z])
}
