//! Static registry of compiled connector modules.

use super::module::ConnectorModule;
use std::collections::HashMap;
use std::sync::Arc;

/// Compiled connector modules keyed by package slug.
///
/// A package directory whose slug has no module still boots; its
/// components simply have no entry points.
#[derive(Debug, Default, Clone)]
pub struct ConnectorCatalog {
    modules: HashMap<String, Arc<ConnectorModule>>,
}

impl ConnectorCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module (builder style).
    pub fn with_module(mut self, module: ConnectorModule) -> Self {
        self.register(module);
        self
    }

    /// Add or replace a module.
    pub fn register(&mut self, module: ConnectorModule) {
        self.modules
            .insert(module.slug().to_string(), Arc::new(module));
    }

    /// Look up the module for a slug.
    pub fn get(&self, slug: &str) -> Option<Arc<ConnectorModule>> {
        self.modules.get(slug).cloned()
    }

    /// Whether a module is registered for a slug.
    pub fn contains(&self, slug: &str) -> bool {
        self.modules.contains_key(slug)
    }

    /// Registered slugs, sorted.
    pub fn slugs(&self) -> Vec<&str> {
        let mut slugs: Vec<_> = self.modules.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let catalog = ConnectorCatalog::new()
            .with_module(ConnectorModule::builder("weather").build())
            .with_module(ConnectorModule::builder("test_hello").build());

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("weather"));
        assert_eq!(catalog.get("weather").unwrap().slug(), "weather");
        assert!(catalog.get("unknown").is_none());
        assert_eq!(catalog.slugs(), vec!["test_hello", "weather"]);
    }

    #[test]
    fn later_registration_replaces() {
        let mut catalog = ConnectorCatalog::new();
        catalog.register(ConnectorModule::builder("a").build());
        catalog.register(
            ConnectorModule::builder("a")
                .on_boot(|| Ok(()))
                .build(),
        );
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("a").unwrap().boot_hook().is_some());
    }
}
