//! In-process index a unit builds at boot.

use dockyard_core::connector::ConnectorModule;
use dockyard_core::definition::{AppDefinition, ComponentDefinition};
use dockyard_core::metadata::{ComponentIndex, UnitManifest};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a unit serves from. Read-only after boot.
#[derive(Debug)]
pub struct UnitIndex {
    manifest: UnitManifest,
    by_key: HashMap<String, usize>,
    module: Option<Arc<ConnectorModule>>,
}

impl UnitIndex {
    /// Build the index. Keys must already be unique.
    pub fn new(manifest: UnitManifest, module: Option<Arc<ConnectorModule>>) -> Self {
        let by_key = manifest
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.clone(), i))
            .collect();
        Self {
            manifest,
            by_key,
            module,
        }
    }

    /// Package slug.
    pub fn slug(&self) -> &str {
        &self.manifest.slug
    }

    /// The bulk metadata announced with `ready`.
    pub fn manifest(&self) -> &UnitManifest {
        &self.manifest
    }

    /// The app definition, if present.
    pub fn app(&self) -> Option<&AppDefinition> {
        self.manifest.app.as_ref()
    }

    /// Look up a component by key.
    pub fn component(&self, key: &str) -> Option<&ComponentDefinition> {
        self.by_key
            .get(key)
            .and_then(|&i| self.manifest.components.get(i))
    }

    /// The compiled module, if the catalog has one for this slug.
    pub fn module(&self) -> Option<&Arc<ConnectorModule>> {
        self.module.as_ref()
    }

    /// Action and trigger keys.
    pub fn component_index(&self) -> ComponentIndex {
        self.manifest.index()
    }
}
