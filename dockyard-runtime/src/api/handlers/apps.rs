//! App endpoint handlers.

use crate::api::error::ApiError;
use crate::api::request;
use crate::api::response;
use crate::api::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response};
use hyper::body::Incoming;
use std::sync::Arc;

/// GET /v1/apps?q=&limit=
///
/// `q` filters by a case-insensitive substring of the app name. `total_count`
/// counts every match; `limit` only trims the returned page.
pub async fn list(req: Request<Incoming>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let query = req.uri().query();
    let needle = request::query_param(query, "q")
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut apps = state.registry.list_apps().await;
    if let Some(needle) = &needle {
        apps.retain(|app| app.name.trim().to_lowercase().contains(needle.as_str()));
    }

    let total = apps.len();
    if let Some(limit) = request::parse_limit(query) {
        apps.truncate(limit);
    }
    response::page(&apps, total)
}

/// GET /v1/apps/{slug}
pub async fn get(state: Arc<AppState>, slug: &str) -> Response<Full<Bytes>> {
    match state.registry.get_app(slug).await {
        Ok(app) => response::data(&app),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET /v1/apps/{slug}/actions
pub async fn actions(state: Arc<AppState>, slug: &str) -> Response<Full<Bytes>> {
    match state.registry.list_actions_for_app(slug).await {
        Ok(actions) => response::page(&actions, actions.len()),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// GET /v1/apps/{slug}/triggers
pub async fn triggers(state: Arc<AppState>, slug: &str) -> Response<Full<Bytes>> {
    match state.registry.list_triggers_for_app(slug).await {
        Ok(triggers) => response::page(&triggers, triggers.len()),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// POST /v1/apps/{slug}/register
///
/// Registers the package, replacing a live unit with the same slug.
pub async fn register(state: Arc<AppState>, slug: &str) -> Response<Full<Bytes>> {
    match state.registry.register_package(slug).await {
        Ok(app) => response::data(&app),
        Err(e) => ApiError::from(e).into_response(),
    }
}
