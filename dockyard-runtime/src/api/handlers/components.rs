//! Component endpoint handlers.

use crate::api::error::ApiError;
use crate::api::request;
use crate::api::response;
use crate::api::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Body of `POST /v1/components/props`.
#[derive(Debug, Deserialize)]
pub struct PropOptionsBody {
    /// Calling user.
    #[serde(default)]
    pub external_user_id: String,
    /// Component key.
    #[serde(default)]
    pub id: String,
    /// Prop whose options are requested.
    #[serde(default)]
    pub prop_name: String,
    /// Props configured so far.
    #[serde(default)]
    pub configured_props: Map<String, Value>,
    /// Cursor from the previous page.
    #[serde(default)]
    pub prev_context: Option<Value>,
}

/// Body of `POST /v1/components/configure` and `POST /v1/actions/run`.
#[derive(Debug, Deserialize)]
pub struct ConfiguredBody {
    /// Calling user.
    #[serde(default)]
    pub external_user_id: String,
    /// Component key.
    #[serde(default)]
    pub id: String,
    /// Input props.
    pub configured_props: Option<Map<String, Value>>,
}

fn require(fields: &[(&str, bool)]) -> Result<(), ApiError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "D000",
            format!("Missing required fields: {}", missing.join(", ")),
        ))
    }
}

/// GET /v1/components/{key}
pub async fn get(state: Arc<AppState>, key: &str) -> Response<Full<Bytes>> {
    match state.registry.get_component(key).await {
        Ok(component) => response::data(&component),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /v1/components/props
///
/// Responds with `{ "props": { <prop_name>: { options, context } } }`.
pub async fn prop_options(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let body: PropOptionsBody = match request::read_json(req).await {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = require(&[
        ("external_user_id", !body.external_user_id.is_empty()),
        ("id", !body.id.is_empty()),
        ("prop_name", !body.prop_name.is_empty()),
    ]) {
        return e.into_response();
    }

    let result = state
        .registry
        .resolve_prop_options(
            &body.external_user_id,
            &body.id,
            &body.prop_name,
            body.configured_props,
            body.prev_context,
        )
        .await;

    match result {
        Ok(page) => {
            let mut props = Map::new();
            props.insert(body.prop_name, serde_json::to_value(&page).unwrap_or_default());
            response::ok(&serde_json::json!({ "props": props }))
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /v1/components/configure
///
/// Echoes every configurable prop with its configured value, falling back
/// to the declared default.
pub async fn configure(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let body: ConfiguredBody = match request::read_json(req).await {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = require(&[
        ("external_user_id", !body.external_user_id.is_empty()),
        ("id", !body.id.is_empty()),
        ("configured_props", body.configured_props.is_some()),
    ]) {
        return e.into_response();
    }
    let configured = body.configured_props.unwrap_or_default();

    let component = match state.registry.get_component(&body.id).await {
        Ok(component) => component,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let mut props = Map::new();
    for prop in &component.configurable_props {
        let mut entry = match serde_json::to_value(prop) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let value = configured
            .get(&prop.name)
            .filter(|v| !v.is_null())
            .cloned()
            .or_else(|| prop.default.clone())
            .unwrap_or(Value::Null);
        entry.insert("value".to_string(), value);
        props.insert(prop.name.clone(), Value::Object(entry));
    }

    response::ok(&serde_json::json!({ "props": props }))
}

/// POST /v1/actions/run
pub async fn run(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let body: ConfiguredBody = match request::read_json(req).await {
        Ok(body) => body,
        Err(e) => return e.into_response(),
    };
    if let Err(e) = require(&[
        ("external_user_id", !body.external_user_id.is_empty()),
        ("id", !body.id.is_empty()),
        ("configured_props", body.configured_props.is_some()),
    ]) {
        return e.into_response();
    }

    let result = state
        .registry
        .invoke_component(
            &body.external_user_id,
            &body.id,
            body.configured_props.unwrap_or_default(),
        )
        .await;

    match result {
        Ok(output) => response::ok(&serde_json::json!({
            "run_id": format!("run_{}", uuid::Uuid::new_v4().simple()),
            "status": "succeeded",
            "output": output,
        })),
        Err(e) => {
            tracing::warn!(key = %body.id, error = %e, "Component run failed");
            ApiError::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_listed() {
        let err = require(&[("id", false), ("prop_name", true), ("external_user_id", false)])
            .unwrap_err();
        assert_eq!(err.status, hyper::StatusCode::BAD_REQUEST);
        assert!(err.message.contains("id, external_user_id"));
        assert!(require(&[("id", true)]).is_ok());
    }

    #[test]
    fn run_body_requires_configured_props_key() {
        let body: ConfiguredBody =
            request::parse_json(br#"{"external_user_id": "u", "id": "k"}"#).unwrap();
        assert!(body.configured_props.is_none());

        let body: ConfiguredBody = request::parse_json(
            br#"{"external_user_id": "u", "id": "k", "configured_props": {}}"#,
        )
        .unwrap();
        assert_eq!(body.configured_props, Some(Map::new()));
    }
}
