//! Prelude for convenient imports.
//!
//! # Example
//!
//! ```ignore
//! use dockyard_core::prelude::*;
//! ```

// Core types
pub use crate::types::{Generation, RequestId};

// Error handling
pub use crate::error::{DockyardError, ErrorKind, Result};

// Definitions
pub use crate::definition::{
    AppDefinition, ComponentDefinition, ComponentType, ManifestMetadata, NamedProp,
    PackageManifest, PropReference, RawOption, RawProp,
};

// Metadata
pub use crate::metadata::{
    AppMetadata, ComponentIndex, ComponentMetadata, OptionsPage, PropOption, PropSpec,
    UnitManifest,
};

// Credentials
pub use crate::credential::{Credential, CredentialFuture, CredentialStore, MemoryCredentialStore};

// Connector API
pub use crate::connector::{
    AppMethods, ConnectorCatalog, ConnectorError, ConnectorFuture, ConnectorModule,
    ConnectorResult, Exports, MethodContext, OptionsContext, RunContext, SUMMARY_KEY,
};
