//! Request body and query helpers.

use super::error::ApiError;
use http_body_util::{BodyExt, Limited};
use hyper::Request;
use hyper::body::Incoming;
use serde::de::DeserializeOwned;

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Read and parse a JSON request body.
pub async fn read_json<T: DeserializeOwned>(req: Request<Incoming>) -> Result<T, ApiError> {
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES);
    let bytes = body
        .collect()
        .await
        .map_err(|e| ApiError::bad_request("D000", format!("Failed to read body: {}", e)))?
        .to_bytes();
    parse_json(&bytes)
}

/// Parse a JSON document, treating an empty body as `{}`.
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        bytes
    };
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::bad_request("D502", format!("Invalid JSON body: {}", e)))
}

/// Value of a query parameter. `+` decodes to a space.
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.replace('+', " "))
}

/// Parse a positive `limit` query parameter.
pub fn parse_limit(query: Option<&str>) -> Option<usize> {
    query_param(query, "limit")
        .and_then(|v| v.parse().ok())
        .filter(|&n: &usize| n > 0)
}
