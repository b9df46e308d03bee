//! Dockyard runtime - the connector host.
//!
//! This crate hosts connector packages:
//! - Package preparation (dependency materialization)
//! - Execution units, one per package, each on its own thread and runtime
//! - The request/response channel between host and units
//! - Metadata normalization
//! - The [`ConnectorRegistry`](registry::ConnectorRegistry) facade
//! - A thin HTTP API over the registry
//! - Tracing setup

#![warn(missing_docs)]

pub mod api;
pub mod channel;
pub mod config;
pub mod normalize;
pub mod observability;
pub mod preparer;
pub mod registry;
pub mod unit;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::api::{ApiError, ApiServer, AppState, ServerConfig, ShutdownHandle};
    pub use crate::channel::{PendingTable, UnitConnection};
    pub use crate::config::HostConfig;
    pub use crate::normalize::{normalize_app, normalize_component, normalize_unit};
    pub use crate::observability::{LogFormat, TracingConfig, TracingGuard, init_tracing};
    pub use crate::preparer::{
        CommandInstaller, DependencyInstaller, NoopInstaller, PackagePreparer, PrepareOutcome,
    };
    pub use crate::registry::{
        ConnectorRegistry, ConnectorRegistryBuilder, LoadReport, MetricsSnapshot,
    };
    pub use crate::unit::{ThreadLauncher, UnitChannel, UnitLauncher, UnitSpec};
}
