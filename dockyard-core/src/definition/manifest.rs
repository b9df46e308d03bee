//! Package manifest (`connector.yaml`).

use super::read_yaml;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Metadata overrides published by a package.
///
/// Every field set here wins over the value derived from the slug or the
/// app definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestMetadata {
    /// Stable app id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// URL-safe name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_slug: Option<String>,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
    /// Catalogue categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// JSON-encoded custom auth fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields_json: Option<String>,
    /// Authentication scheme (`none`, `keys`, `oauth`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
}

/// Package manifest.
///
/// # Example
///
/// ```yaml
/// name: weather
/// version: 1.2.0
/// description: Forecasts by city
/// dependencies:
///   http-client: ^2.1
/// metadata:
///   img_src: https://example.com/weather.png
///   categories: [Weather]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageManifest {
    /// Package name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Package version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Package description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// App definition file, relative to the package root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    /// Third-party dependencies to materialize before boot.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    /// Peer dependencies.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
    /// Metadata overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ManifestMetadata>,
}

impl PackageManifest {
    /// Manifest file name inside a package directory.
    pub const FILE_NAME: &'static str = "connector.yaml";

    /// Default app definition file name.
    pub const DEFAULT_APP_FILE: &'static str = "app.yaml";

    /// Load the manifest of the package at `dir`. A missing manifest yields
    /// the defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        read_yaml(&path)
    }

    /// Whether the package declares any dependencies to install.
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty() || !self.peer_dependencies.is_empty()
    }

    /// Path of the app definition file, relative to the package root.
    pub fn app_file(&self) -> &str {
        self.main
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(Self::DEFAULT_APP_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manifest_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = PackageManifest::load(dir.path()).unwrap();
        assert_eq!(manifest, PackageManifest::default());
        assert!(!manifest.has_dependencies());
        assert_eq!(manifest.app_file(), "app.yaml");
    }

    #[test]
    fn parses_full_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PackageManifest::FILE_NAME),
            r#"
name: weather
version: 1.2.0
main: weather.app.yaml
peer_dependencies:
  runtime: "*"
metadata:
  categories: [Weather, Data]
  auth_type: keys
"#,
        )
        .unwrap();

        let manifest = PackageManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.version.as_deref(), Some("1.2.0"));
        assert_eq!(manifest.app_file(), "weather.app.yaml");
        assert!(manifest.has_dependencies());
        let metadata = manifest.metadata.unwrap();
        assert_eq!(metadata.categories.unwrap().len(), 2);
        assert_eq!(metadata.auth_type.as_deref(), Some("keys"));
    }

    #[test]
    fn malformed_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PackageManifest::FILE_NAME), "name: [unclosed").unwrap();
        let err = PackageManifest::load(dir.path()).unwrap_err();
        assert_eq!(err.code(), "D505");
    }
}
