//! Health and status endpoint handlers.

use crate::api::response;
use crate::api::state::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use std::sync::Arc;

/// GET /health
///
/// Liveness plus a summary of the registry.
pub async fn get_health(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "status": "healthy",
        "service": "dockyard",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.uptime_secs(),
        "apps": state.registry.live_slugs(),
        "metrics": state.registry.metrics(),
    });

    response::ok(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ConnectorRegistry;
    use hyper::StatusCode;

    #[tokio::test]
    async fn health_check_returns_ok() {
        let state = Arc::new(AppState::new(ConnectorRegistry::builder().build()));
        let response = get_health(state).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
