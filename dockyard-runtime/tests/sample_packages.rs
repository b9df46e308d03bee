//! End-to-end tests against the sample package store and built-in connectors.

mod common;

use common::sample_packages;
use dockyard_connectors::standard_catalog;
use dockyard_core::credential::{Credential, MemoryCredentialStore};
use dockyard_core::error::DockyardError;
use dockyard_runtime::config::HostConfig;
use dockyard_runtime::preparer::PackagePreparer;
use dockyard_runtime::registry::ConnectorRegistry;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;

async fn loaded_registry(credentials: MemoryCredentialStore) -> ConnectorRegistry {
    let config = HostConfig::new(sample_packages())
        .with_boot_timeout(Duration::from_secs(5))
        .with_rpc_timeout(Duration::from_secs(5));
    let registry = ConnectorRegistry::builder()
        .config(config)
        .catalog(standard_catalog())
        .preparer(PackagePreparer::noop())
        .credentials(Arc::new(credentials))
        .build();
    let report = registry.load_all().await.unwrap();
    assert!(report.is_complete(), "failed packages: {:?}", report.failed);
    registry
}

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn sample_store_loads_both_apps() {
    let registry = loaded_registry(MemoryCredentialStore::new()).await;

    let apps = registry.list_apps().await;
    let names: Vec<(&str, &str)> = apps
        .iter()
        .map(|a| (a.name_slug.as_str(), a.name.as_str()))
        .collect();
    assert_eq!(names, vec![("test_hello", "Test Hello"), ("weather", "Weather")]);
    assert_eq!(apps[1].version.as_deref(), Some("1.0.0"));

    let severe = registry.get_component("severe_alert").await.unwrap();
    assert_eq!(severe.app, "weather");
    registry.shutdown();
}

#[tokio::test]
async fn forecast_with_empty_input_uses_defaults_and_exports() {
    let registry = loaded_registry(MemoryCredentialStore::new()).await;

    let result = registry
        .invoke_component("user-1", "get_forecast", Map::new())
        .await
        .unwrap();
    assert_eq!(result["city"], json!("NYC"));
    assert_eq!(result["units"], json!("metric"));
    assert_eq!(result["summary"], json!("Forecast for NYC"));
    assert_eq!(result["$summary"], json!("Forecast for NYC"));
    registry.shutdown();
}

#[tokio::test]
async fn connector_errors_pass_through_unmodified() {
    let registry = loaded_registry(MemoryCredentialStore::new()).await;

    let err = registry
        .invoke_component("user-1", "get_forecast", props(json!({"units": "rankine"})))
        .await
        .unwrap_err();
    match err {
        DockyardError::InvocationFailed { key, message, debug, .. } => {
            assert_eq!(key, "get_forecast");
            assert_eq!(message, "unknown units 'rankine'");
            assert_eq!(
                debug,
                Some(json!({"allowed": ["metric", "imperial", "standard"]}))
            );
        }
        other => panic!("expected invocation failure, got {:?}", other),
    }
    registry.shutdown();
}

#[tokio::test]
async fn dynamic_options_paginate_with_context() {
    let registry = loaded_registry(MemoryCredentialStore::new()).await;

    let units = registry
        .resolve_prop_options("user-1", "get_forecast", "units", Map::new(), None)
        .await
        .unwrap();
    let labels: Vec<&str> = units.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Celsius", "Fahrenheit", "Kelvin"]);

    let mut seen = Vec::new();
    let mut context = None;
    loop {
        let page = registry
            .resolve_prop_options("user-1", "get_forecast", "city", Map::new(), context)
            .await
            .unwrap();
        seen.extend(page.options.into_iter().map(|o| o.value));
        context = page.context;
        if context.is_none() {
            break;
        }
    }
    assert_eq!(seen.len(), 9);
    assert_eq!(seen[0], json!("NYC"));
    registry.shutdown();
}

#[tokio::test]
async fn static_options_resolve_to_an_empty_page() {
    let registry = loaded_registry(MemoryCredentialStore::new()).await;

    let page = registry
        .resolve_prop_options("user-1", "scrape_search", "engine", Map::new(), None)
        .await
        .unwrap();
    assert!(page.options.is_empty());
    assert!(page.context.is_none());
    registry.shutdown();
}

#[tokio::test]
async fn credentials_are_scoped_to_user_and_connector() {
    let credentials = MemoryCredentialStore::new().with_credential(
        "user-1",
        "test_hello",
        Credential::new().with("api_key", "secret"),
    );
    let registry = loaded_registry(credentials).await;

    let result = registry
        .invoke_component("user-1", "scrape_search", Map::new())
        .await
        .unwrap();
    assert_eq!(result["request"]["params"]["q"], json!("weather of indore"));
    assert_eq!(result["request"]["params"]["engine"], json!("google"));
    assert_eq!(result["request"]["authorized"], json!(true));
    assert_eq!(
        result["$summary"],
        json!("Successfully sent query to 'google'")
    );
    assert!(!result.to_string().contains("secret"));

    let err = registry
        .invoke_component("user-2", "scrape_search", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DockyardError::InvocationFailed { .. }));

    let hello = registry
        .invoke_component("user-2", "hello_world", Map::new())
        .await
        .unwrap();
    assert_eq!(hello, json!({"message": "Hello, World!"}));
    registry.shutdown();
}
