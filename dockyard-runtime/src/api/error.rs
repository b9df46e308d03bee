//! API error types and DockyardError → HTTP status mapping.

use super::response;
use bytes::Bytes;
use dockyard_core::error::{DockyardError, ErrorKind};
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::{Map, Value};

/// API error with HTTP status code and error code.
#[derive(Debug)]
pub struct ApiError {
    /// Error code (e.g., "D101").
    pub code: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    pub status: StatusCode,
    /// Extra fields merged into the error body.
    pub details: Map<String, Value>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: &'static str, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code,
            message: message.into(),
            status,
            details: Map::new(),
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(code, message, StatusCode::BAD_REQUEST)
    }

    /// Create a 404 Not Found error.
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(code, message, StatusCode::NOT_FOUND)
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(code, message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Attach an extra field to the error body.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Convert to HTTP response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut error = Map::new();
        error.insert("code".to_string(), Value::from(self.code));
        error.insert("message".to_string(), Value::from(self.message));
        error.insert("status".to_string(), Value::from(self.status.as_u16()));
        error.extend(self.details);

        let body = serde_json::json!({ "error": error });
        response::json_response(self.status, &body)
    }
}

impl From<DockyardError> for ApiError {
    fn from(err: DockyardError) -> Self {
        let code = err.code();

        let status = match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::UnitCrashed => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::DefinitionInvalid => match &err {
                DockyardError::DuplicateComponentKey { .. } => StatusCode::CONFLICT,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Connector failures carry their own message and payload unmodified.
        if let DockyardError::InvocationFailed {
            key,
            message,
            debug,
            exports,
        } = err
        {
            let mut api = Self::new(code, message, status).with_detail("component", key);
            if let Some(debug) = debug {
                api = api.with_detail("debug", debug);
            }
            if !exports.is_empty() {
                api = api.with_detail("exports", Value::Object(exports));
            }
            return api;
        }

        Self::new(code, err.to_string(), status)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn not_found_mapping() {
        let api_err: ApiError = DockyardError::ComponentNotFound {
            key: "nope".to_string(),
        }
        .into();
        assert_eq!(api_err.code, "D101");
        assert_eq!(api_err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn lifecycle_mapping() {
        let timeout: ApiError = DockyardError::RpcTimeout {
            slug: "weather".to_string(),
            operation: "runComponent".to_string(),
            timeout_ms: 15_000,
        }
        .into();
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);

        let crashed: ApiError = DockyardError::UnitCrashed {
            slug: "weather".to_string(),
            cause: "execution unit exited".to_string(),
        }
        .into();
        assert_eq!(crashed.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn invocation_failure_passes_connector_payload_through() {
        let mut exports = Map::new();
        exports.insert("$summary".to_string(), json!("partial"));
        let api_err: ApiError = DockyardError::InvocationFailed {
            key: "get_forecast".to_string(),
            message: "upstream said no".to_string(),
            debug: Some(json!({"status": 429})),
            exports,
        }
        .into();

        assert_eq!(api_err.code, "D401");
        assert_eq!(api_err.message, "upstream said no");
        assert_eq!(api_err.details["debug"], json!({"status": 429}));
        assert_eq!(api_err.details["exports"]["$summary"], "partial");
    }

    #[test]
    fn error_response_format() {
        let response = ApiError::not_found("D102", "App 'x' not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
