//! On-disk connector definitions.
//!
//! A package directory holds:
//!
//! ```text
//! weather/
//! ├── connector.yaml          # PackageManifest (optional)
//! ├── app.yaml                # AppDefinition (optional, or manifest `main`)
//! ├── actions/
//! │   ├── get_forecast.yaml   # ComponentDefinition
//! │   └── alerts/
//! │       ├── alerts.yaml
//! │       └── test-event.yaml # ignored
//! └── triggers/               # `sources/` is accepted too
//! ```
//!
//! These types are plain data. Executable code lives in the connector
//! catalog and is bound by name.

mod app;
mod component;
mod manifest;
mod prop;

pub use app::AppDefinition;
pub use component::{ComponentDefinition, ComponentType};
pub use manifest::{ManifestMetadata, PackageManifest};
pub use prop::{NamedProp, PropReference, RawOption, RawProp, ordered_props};

use crate::error::{DockyardError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and parse a YAML definition file.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| DockyardError::Io {
        path: path.to_path_buf(),
        cause: e.to_string(),
    })?;
    serde_yaml::from_str(&content).map_err(|e| DockyardError::YamlParse {
        path: path.to_path_buf(),
        cause: e.to_string(),
    })
}

/// Whether a file name looks like a YAML definition.
pub fn is_definition_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Whether a file is a sample event fixture rather than a definition.
pub fn is_test_event(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s == "test-event")
}
