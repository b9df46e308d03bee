//! Common test utilities for integration tests.

#![allow(dead_code)]

use dockyard_core::connector::{
    ConnectorCatalog, ConnectorError, ConnectorModule, ConnectorResult, OptionsContext,
    RunContext,
};
use dockyard_runtime::config::HostConfig;
use dockyard_runtime::preparer::PackagePreparer;
use dockyard_runtime::registry::ConnectorRegistry;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A package store in a temporary directory.
pub struct PackageStore {
    dir: TempDir,
}

impl PackageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Store root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the store root.
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create package dirs");
        }
        std::fs::write(path, content).expect("write package file");
        self
    }

    /// Path of a package directory.
    pub fn package_dir(&self, slug: &str) -> PathBuf {
        self.dir.path().join(slug)
    }

    /// Write the `echo` package.
    pub fn with_echo(&self) -> &Self {
        self.write("echo/app.yaml", ECHO_APP)
            .write("echo/actions/echo.yaml", ECHO_ACTION)
            .write("echo/actions/slow.yaml", "key: slow\nprops:\n  ms:\n    type: integer\n    default: 50\n")
            .write("echo/actions/explode.yaml", "key: explode\n")
            .write("echo/actions/broken.yaml", "key: broken\nrun: not_compiled\n")
            .write("echo/triggers/tick/tick.yaml", "key: tick\nname: Tick\n")
    }

    /// Write the `sleepy` package whose boot hook outlasts short boot timeouts.
    pub fn with_sleepy(&self) -> &Self {
        self.write("sleepy/actions/nap.yaml", "key: nap\n")
    }
}

const ECHO_APP: &str = r#"
app: echo
auth_type: keys
prop_definitions:
  color:
    type: string
    label: Color
    options_resolver: list_colors
  mood:
    type: string
    label: Mood
    options: [happy, grumpy]
"#;

const ECHO_ACTION: &str = r#"
key: echo
name: Echo
version: 1.2.3
props:
  message:
    type: string
    default: hi
  color:
    prop_definition: true
    optional: true
  mood:
    prop_definition: true
"#;

/// Catalog with the `echo` and `sleepy` connectors.
pub fn test_catalog(sleepy_boot: Duration) -> ConnectorCatalog {
    let echo = ConnectorModule::builder("echo")
        .entry_point("echo", |ctx: RunContext| async move {
            let token = ctx.credential.get_str("token").map(str::to_string);
            ctx.exports.summary("echoed");
            Ok(json!({ "props": Value::Object(ctx.props), "token": token }))
        })
        .entry_point("slow", |ctx: RunContext| async move {
            let ms = ctx.prop("ms").and_then(Value::as_u64).unwrap_or(50);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(json!({ "slept_ms": ms }))
        })
        .entry_point("explode", |_ctx: RunContext| async move { explode() })
        .options_resolver("list_colors", |ctx: OptionsContext| async move {
            if ctx.configured_props.get("fail").is_some() {
                return Err(ConnectorError::new("color service down"));
            }
            let user = ctx.user_id.clone();
            Ok(json!([
                "red",
                { "label": format!("Blue for {}", user), "value": "blue" }
            ]))
        })
        .build();

    let sleepy = ConnectorModule::builder("sleepy")
        .on_boot(move || {
            std::thread::sleep(sleepy_boot);
            Ok(())
        })
        .entry_point("nap", |_ctx: RunContext| async { Ok(json!("zzz")) })
        .build();

    ConnectorCatalog::new().with_module(echo).with_module(sleepy)
}

fn explode() -> ConnectorResult<Value> {
    panic!("connector bug")
}

/// Host config with short timeouts rooted at `root`.
pub fn test_config(root: &Path) -> HostConfig {
    HostConfig::new(root)
        .with_boot_timeout(Duration::from_secs(5))
        .with_rpc_timeout(Duration::from_secs(5))
}

/// Registry with the test catalog.
pub fn test_registry(config: HostConfig) -> ConnectorRegistry {
    ConnectorRegistry::builder()
        .config(config)
        .catalog(test_catalog(Duration::from_millis(1500)))
        .preparer(PackagePreparer::noop())
        .build()
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Path of the sample package store shipped with the workspace.
pub fn sample_packages() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../packages")
}
