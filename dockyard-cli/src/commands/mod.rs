//! CLI command implementations.

pub mod apps;
pub mod components;
pub mod options;
pub mod run;
pub mod serve;
pub mod version;

use anyhow::{Context, Result};
use dockyard_connectors::standard_catalog;
use dockyard_runtime::config::HostConfig;
use dockyard_runtime::registry::ConnectorRegistry;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Where the host reads its configuration from.
pub struct HostOptions {
    /// Package store root override.
    pub packages: Option<PathBuf>,
    /// Configuration file.
    pub config: Option<PathBuf>,
}

impl HostOptions {
    /// Resolve the host configuration: file (or defaults), then environment,
    /// then the `--packages` flag.
    pub fn host_config(&self) -> Result<HostConfig> {
        let base = match &self.config {
            Some(path) => HostConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => HostConfig::default(),
        };
        let mut config = base.merge_env().context("Invalid environment configuration")?;
        if let Some(dir) = &self.packages {
            config.packages_dir = dir.clone();
        }
        Ok(config)
    }

    /// Build a registry over the built-in connectors.
    pub fn registry(&self) -> Result<ConnectorRegistry> {
        Ok(ConnectorRegistry::builder()
            .config(self.host_config()?)
            .catalog(standard_catalog())
            .build())
    }

    /// Build a registry and load every package in the store.
    pub async fn loaded_registry(&self) -> Result<ConnectorRegistry> {
        let registry = self.registry()?;
        let report = registry.load_all().await.with_context(|| {
            format!(
                "Failed to scan package store: {}",
                registry.config().packages_dir.display()
            )
        })?;

        for failed in &report.failed {
            eprintln!("warning: package '{}' failed to load: {}", failed.slug, failed.error);
        }
        tracing::info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Package store loaded"
        );
        Ok(registry)
    }
}

/// Parse a `--props` style argument into a JSON object.
pub fn parse_object(name: &str, raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw).with_context(|| format!("--{} is not valid JSON", name))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => anyhow::bail!("--{} must be a JSON object, got {}", name, other),
    }
}

/// Print a value as pretty JSON.
pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_object_accepts_objects_and_null() {
        let map = parse_object("props", r#"{"city": "Oslo"}"#).unwrap();
        assert_eq!(map["city"], "Oslo");
        assert!(parse_object("props", "null").unwrap().is_empty());
    }

    #[test]
    fn parse_object_rejects_other_json() {
        assert!(parse_object("props", "[1]").is_err());
        assert!(parse_object("props", "{oops").is_err());
    }

    #[test]
    fn packages_flag_wins() {
        let options = HostOptions {
            packages: Some(PathBuf::from("/srv/connectors")),
            config: None,
        };
        let config = options.host_config().unwrap();
        assert_eq!(config.packages_dir, PathBuf::from("/srv/connectors"));
    }
}
