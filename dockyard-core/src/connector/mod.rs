//! Connector plugin API.
//!
//! Connector code is compiled in and registered in a [`ConnectorCatalog`].
//! Each invocation receives an owned context carrying the user's
//! credential, the app's shared methods bound to that credential, and an
//! export bag.

mod catalog;
mod context;
mod error;
mod exports;
mod module;

pub use catalog::ConnectorCatalog;
pub use context::{AppMethods, MethodContext, OptionsContext, RunContext};
pub use error::{ConnectorError, ConnectorResult};
pub use exports::{Exports, SUMMARY_KEY};
pub use module::{
    BootFn, ConnectorFuture, ConnectorModule, ConnectorModuleBuilder, MethodFn, ResolverFn, RunFn,
};
