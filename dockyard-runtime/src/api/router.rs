//! Request routing for the API.
//!
//! Routes requests to handlers based on method and path.

use super::handlers;
use super::response;
use super::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Route prefix for versioned endpoints.
const API_PREFIX: &str = "/v1";

/// Route an incoming request to the appropriate handler.
pub async fn route(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    tracing::debug!(method = %method, path = %path, "Routing request");

    if path == "/health" {
        return Ok(match method {
            Method::GET => handlers::health::get_health(state).await,
            _ => response::method_not_allowed(&["GET"]),
        });
    }

    let Some(path) = path.strip_prefix(API_PREFIX) else {
        return Ok(response::not_found());
    };

    let response = match (method, path) {
        (Method::GET, "/apps") => handlers::apps::list(req, state).await,
        (_, "/apps") => response::method_not_allowed(&["GET"]),
        (_, p) if p.starts_with("/apps/") => route_app_subpath(req, state, p).await,

        (Method::POST, "/components/props") => handlers::components::prop_options(req, state).await,
        (Method::POST, "/components/configure") => handlers::components::configure(req, state).await,
        (_, "/components/props" | "/components/configure") => response::method_not_allowed(&["POST"]),
        (Method::GET, p) if p.starts_with("/components/") => {
            match p.strip_prefix("/components/").filter(|k| !k.is_empty() && !k.contains('/')) {
                Some(key) => handlers::components::get(state, key).await,
                None => response::not_found(),
            }
        }

        (Method::POST, "/actions/run") => handlers::components::run(req, state).await,
        (_, "/actions/run") => response::method_not_allowed(&["POST"]),

        _ => response::not_found(),
    };

    Ok(response)
}

/// Route requests under /apps/{slug}/...
async fn route_app_subpath(
    req: Request<Incoming>,
    state: Arc<AppState>,
    path: &str,
) -> Response<Full<Bytes>> {
    let method = req.method();

    let path = path.strip_prefix("/apps/").unwrap_or("");
    let (slug, subpath) = match path.split_once('/') {
        Some((slug, rest)) => (slug, Some(rest)),
        None => (path, None),
    };

    if slug.is_empty() {
        return response::not_found();
    }

    match (method, subpath) {
        (&Method::GET, None) => handlers::apps::get(state, slug).await,
        (&Method::GET, Some("actions")) => handlers::apps::actions(state, slug).await,
        (&Method::GET, Some("triggers")) => handlers::apps::triggers(state, slug).await,
        (&Method::POST, Some("register")) => handlers::apps::register(state, slug).await,
        (_, None | Some("actions") | Some("triggers")) => response::method_not_allowed(&["GET"]),
        (_, Some("register")) => response::method_not_allowed(&["POST"]),
        _ => response::not_found(),
    }
}
