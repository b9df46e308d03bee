//! Integration tests for unit crashes and RPC timeouts.
//!
//! A unit that faults must reject every outstanding request and vanish from
//! the catalogue; a slow unit must time out its caller without being torn
//! down.

mod common;

use common::{PackageStore, test_config, test_registry, wait_until};
use dockyard_core::error::DockyardError;
use serde_json::{Map, json};
use std::time::Duration;

fn slow_props(ms: u64) -> Map<String, serde_json::Value> {
    let mut props = Map::new();
    props.insert("ms".to_string(), json!(ms));
    props
}

#[tokio::test]
async fn crash_rejects_every_pending_request() {
    let store = PackageStore::new();
    store.with_echo();
    let registry = test_registry(test_config(store.root()));
    registry.register_package("echo").await.unwrap();

    let mut pending = Vec::new();
    for _ in 0..5 {
        let registry = registry.clone();
        pending.push(tokio::spawn(async move {
            registry
                .invoke_component("user-1", "slow", slow_props(10_000))
                .await
        }));
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = registry
        .invoke_component("user-1", "explode", Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DockyardError::UnitCrashed { .. }));

    for handle in pending {
        let err = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("pending request settled")
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, DockyardError::UnitCrashed { ref slug, .. } if slug == "echo"));
    }

    let registry_ref = &registry;
    assert!(
        wait_until(Duration::from_secs(5), || async move {
            registry_ref.list_apps().await.is_empty()
        })
        .await
    );
    assert!(matches!(
        registry.get_component("slow").await,
        Err(DockyardError::ComponentNotFound { .. })
    ));
    assert_eq!(registry.metrics().crashes, 1);
}

#[tokio::test]
async fn crashed_package_can_be_registered_again() {
    let store = PackageStore::new();
    store.with_echo();
    let registry = test_registry(test_config(store.root()));
    registry.register_package("echo").await.unwrap();

    let _ = registry
        .invoke_component("user-1", "explode", Map::new())
        .await;
    let registry_ref = &registry;
    assert!(
        wait_until(Duration::from_secs(5), || async move {
            registry_ref.live_slugs().is_empty()
        })
        .await
    );

    registry.register_package("echo").await.unwrap();
    let result = registry
        .invoke_component("user-1", "slow", slow_props(1))
        .await
        .unwrap();
    assert_eq!(result["slept_ms"], json!(1));
    registry.shutdown();
}

#[tokio::test]
async fn rpc_timeout_leaves_the_unit_serving() {
    let store = PackageStore::new();
    store.with_echo();
    let config = test_config(store.root()).with_rpc_timeout(Duration::from_millis(200));
    let registry = test_registry(config);
    registry.register_package("echo").await.unwrap();

    let err = registry
        .invoke_component("user-1", "slow", slow_props(1_000))
        .await
        .unwrap_err();
    match err {
        DockyardError::RpcTimeout { slug, operation, timeout_ms } => {
            assert_eq!(slug, "echo");
            assert_eq!(operation, "runComponent");
            assert_eq!(timeout_ms, 200);
        }
        other => panic!("expected timeout, got {:?}", other),
    }

    // The late response is dropped and the unit keeps serving.
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let result = registry
        .invoke_component("user-1", "slow", slow_props(1))
        .await
        .unwrap();
    assert_eq!(result["slept_ms"], json!(1));
    assert_eq!(registry.live_slugs(), vec!["echo".to_string()]);
    assert_eq!(registry.metrics().timeouts, 1);
    registry.shutdown();
}
