//! Records kept for live units.

use crate::channel::UnitConnection;
use dockyard_core::error::DockyardError;
use dockyard_core::metadata::{AppMetadata, ComponentMetadata};
use dockyard_core::types::Generation;
use serde::Serialize;

/// A unit that reached `ready` and was committed to the registry.
#[derive(Debug, Clone)]
pub struct LiveUnit {
    /// Handle for calling into the unit.
    pub connection: UnitConnection,
    /// Normalized app metadata.
    pub app: AppMetadata,
    /// Action keys in discovery order.
    pub actions: Vec<String>,
    /// Trigger keys in discovery order.
    pub triggers: Vec<String>,
}

impl LiveUnit {
    /// Registration generation the unit serves under.
    pub fn generation(&self) -> Generation {
        self.connection.generation()
    }
}

/// Owner and metadata of one component key.
#[derive(Debug, Clone)]
pub(crate) struct ComponentEntry {
    pub slug: String,
    pub generation: Generation,
    pub metadata: ComponentMetadata,
}

/// Result of loading every package in the store.
#[derive(Debug, Default, Serialize)]
pub struct LoadReport {
    /// Slugs that went live.
    pub loaded: Vec<String>,
    /// Slugs that failed, with the reason.
    pub failed: Vec<FailedPackage>,
}

/// A package that failed to register.
#[derive(Debug, Clone, Serialize)]
pub struct FailedPackage {
    /// Package slug.
    pub slug: String,
    /// Why registration failed.
    pub error: DockyardError,
}

impl LoadReport {
    /// Whether every discovered package went live.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total packages attempted.
    pub fn attempted(&self) -> usize {
        self.loaded.len() + self.failed.len()
    }
}
