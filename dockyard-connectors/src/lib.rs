//! Built-in connectors for Dockyard.
//!
//! Each connector is the compiled half of a package: shared app methods,
//! component entry points and options resolvers, registered under the
//! package slug. The matching definitions (manifest, `app.yaml`, action and
//! trigger YAML) live in the package store.
//!
//! - [`test_hello`] - greeting action plus a credential-scoped search action
//! - [`weather`] - forecasts with dynamic unit and paginated city options

pub mod test_hello;
pub mod weather;

use dockyard_core::connector::ConnectorCatalog;

/// Catalog holding every built-in connector.
pub fn standard_catalog() -> ConnectorCatalog {
    ConnectorCatalog::new()
        .with_module(test_hello::module())
        .with_module(weather::module())
}
