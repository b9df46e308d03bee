//! `test_hello`: a greeting action and a search action that goes through
//! the app's shared `scrape_search` method.

use dockyard_core::connector::{ConnectorError, ConnectorModule, ConnectorResult, MethodContext, RunContext};
use serde_json::{Value, json};

/// Package slug.
pub const SLUG: &str = "test_hello";

const BASE_URL: &str = "https://test_hello.com";

/// Build the compiled module.
pub fn module() -> ConnectorModule {
    ConnectorModule::builder(SLUG)
        .method("base_url", |_ctx: MethodContext| async { Ok(json!(BASE_URL)) })
        .method("scrape_search", scrape_search)
        .entry_point("hello_world", hello_world)
        .entry_point("scrape_search", run_scrape_search)
        .build()
}

async fn hello_world(ctx: RunContext) -> ConnectorResult<Value> {
    let name = ctx.prop_str("name").unwrap_or("World");
    Ok(json!({ "message": format!("Hello, {}!", name) }))
}

/// Describe the search request that would be sent upstream.
///
/// The API key comes from the invocation's credential and is never echoed.
async fn scrape_search(ctx: MethodContext) -> ConnectorResult<Value> {
    let api_key = ctx
        .credential
        .get_str("api_key")
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            ConnectorError::new("test_hello is not connected: credential has no api_key")
                .with_debug(json!({ "required": ["api_key"] }))
        })?;

    let base_url = ctx.app.call("base_url", Value::Null).await?;
    let base_url = base_url.as_str().unwrap_or(BASE_URL);
    let engine = ctx.arg_str("engine").unwrap_or("google");
    let q = ctx.arg_str("q").unwrap_or_default();

    tracing::debug!(engine = %engine, "Prepared search request");
    Ok(json!({
        "request": {
            "url": format!("{}/search", base_url),
            "params": { "engine": engine, "q": q },
            "authorized": !api_key.is_empty(),
        }
    }))
}

async fn run_scrape_search(ctx: RunContext) -> ConnectorResult<Value> {
    let engine = ctx.prop_str("engine").unwrap_or("google").to_string();
    let q = ctx.prop_str("q").unwrap_or_default().to_string();

    let response = ctx
        .app
        .call("scrape_search", json!({ "engine": engine, "q": q }))
        .await?;

    ctx.exports
        .summary(format!("Successfully sent query to '{}'", engine));
    Ok(response)
}
