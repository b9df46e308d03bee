//! Dockyard Core Library
//!
//! Foundational types for the Dockyard connector host: the error taxonomy,
//! on-disk connector definitions, normalized metadata, the wire protocol
//! spoken between the host and execution units, and the API connector code
//! is written against.
//!
//! # Key Components
//!
//! - **Definitions**: package manifest, app definition, action/trigger YAML
//! - **Metadata**: normalized app, component and prop descriptions
//! - **Protocol**: request/response envelopes and unit lifecycle events
//! - **Connector**: compiled modules, per-invocation contexts, exports
//! - **Credential**: per-user credential bundles and the lookup contract
//!
//! # Example
//!
//! ```ignore
//! use dockyard_core::prelude::*;
//!
//! let module = ConnectorModule::builder("test_hello")
//!     .entry_point("hello_world", |ctx| async move {
//!         let name = ctx.prop_str("name").unwrap_or("World").to_string();
//!         ctx.exports.summary(format!("Greeted {}", name));
//!         Ok(serde_json::json!({ "greeting": format!("Hello, {}!", name) }))
//!     })
//!     .build();
//!
//! let catalog = ConnectorCatalog::new().with_module(module);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connector;
pub mod credential;
pub mod definition;
pub mod error;
pub mod metadata;
pub mod prelude;
pub mod protocol;
pub mod types;

// Re-export key types at crate root for convenience
pub use connector::{ConnectorCatalog, ConnectorModule};
pub use credential::{Credential, CredentialStore, MemoryCredentialStore};
pub use error::{DockyardError, ErrorKind, Result};
pub use metadata::{AppMetadata, ComponentMetadata, OptionsPage, PropOption, PropSpec};
pub use types::{Generation, RequestId};
