//! Error types for Dockyard.
//!
//! Every error carries the identifiers (connector slug, component key,
//! request operation) needed to trace a failure back to the execution unit
//! that produced it. Errors are serializable so an execution unit can hand a
//! typed failure back to the host across the RPC channel unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Dockyard operations.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum DockyardError {
    // =========================================================================
    // Lookup Errors (D100-D199)
    // =========================================================================
    /// No live execution unit owns the component key.
    #[error("D101: Component '{key}' not found")]
    ComponentNotFound {
        /// The component key that was requested.
        key: String,
    },

    /// No live execution unit is registered under the slug.
    #[error("D102: App '{slug}' not found")]
    AppNotFound {
        /// The connector slug that was requested.
        slug: String,
    },

    /// The component does not declare the requested prop.
    #[error("D103: Prop '{prop}' not found on component '{key}'")]
    PropNotFound {
        /// The component key.
        key: String,
        /// The prop name.
        prop: String,
    },

    /// The package directory does not exist in the package store.
    #[error("D104: Package '{slug}' not found at {path}")]
    PackageNotFound {
        /// The connector slug.
        slug: String,
        /// The directory that was expected to hold the package.
        path: PathBuf,
    },

    // =========================================================================
    // Execution Unit Lifecycle Errors (D200-D299)
    // =========================================================================
    /// The unit did not announce readiness in time.
    #[error("D201: Execution unit '{slug}' did not become ready within {timeout_ms}ms")]
    BootTimeout {
        /// The connector slug.
        slug: String,
        /// Boot timeout in milliseconds.
        timeout_ms: u64,
    },

    /// An RPC call received no response in time.
    #[error("D202: Request '{operation}' to unit '{slug}' timed out after {timeout_ms}ms")]
    RpcTimeout {
        /// The connector slug.
        slug: String,
        /// The operation name (e.g. "runComponent").
        operation: String,
        /// Call timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The unit exited or faulted while the request was outstanding.
    #[error("D203: Execution unit '{slug}' crashed: {cause}")]
    UnitCrashed {
        /// The connector slug.
        slug: String,
        /// Description of the fault or exit.
        cause: String,
    },

    /// The unit could not be started at all.
    #[error("D204: Failed to launch execution unit '{slug}': {cause}")]
    UnitLaunch {
        /// The connector slug.
        slug: String,
        /// Reason for the launch failure.
        cause: String,
    },

    /// The registry is shutting down and accepts no more work.
    #[error("D205: Registry is shutting down")]
    ShuttingDown,

    // =========================================================================
    // Definition Errors (D300-D399)
    // =========================================================================
    /// A definition file is malformed or lacks required fields.
    #[error("D301: Invalid definition at {path}: {cause}")]
    DefinitionInvalid {
        /// The definition file.
        path: PathBuf,
        /// What is wrong with it.
        cause: String,
    },

    /// The component has no executable entry point bound.
    #[error("D302: Component '{key}' has no entry point")]
    MissingEntryPoint {
        /// The component key.
        key: String,
    },

    /// Another live package already owns the component key.
    #[error("D303: Component key '{key}' from '{slug}' is already owned by '{existing_slug}'")]
    DuplicateComponentKey {
        /// The colliding key.
        key: String,
        /// The package that already owns it.
        existing_slug: String,
        /// The package being registered.
        slug: String,
    },

    /// Installing third-party dependencies failed. Logged, never fatal to the host.
    #[error("D304: Dependency install failed for '{slug}': {cause}")]
    DependencyInstallFailed {
        /// The connector slug.
        slug: String,
        /// Installer output or failure reason.
        cause: String,
    },

    // =========================================================================
    // Invocation Errors (D400-D499)
    // =========================================================================
    /// The connector's own code returned an error. Passed through unmodified.
    #[error("D401: Component '{key}' failed: {message}")]
    InvocationFailed {
        /// The component key (or resolver name) that failed.
        key: String,
        /// The connector's error message.
        message: String,
        /// Structured debug payload supplied by the connector, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        debug: Option<Value>,
        /// Values exported before the failure.
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        exports: Map<String, Value>,
    },

    // =========================================================================
    // Protocol / Configuration / I/O Errors (D500-D599)
    // =========================================================================
    /// A frame on the RPC channel could not be understood.
    #[error("D501: Protocol error: {cause}")]
    Protocol {
        /// Description of the malformed frame.
        cause: String,
    },

    /// Serialization/deserialization error.
    #[error("D502: Serialization error: {cause}")]
    Serialization {
        /// The serializer's message.
        cause: String,
    },

    /// Invalid configuration value.
    #[error("D503: Invalid configuration '{field}': {cause}")]
    ConfigValue {
        /// The configuration field.
        field: String,
        /// Why the value is invalid.
        cause: String,
    },

    /// File I/O error.
    #[error("D504: I/O error at {path}: {cause}")]
    Io {
        /// The path where the error occurred.
        path: PathBuf,
        /// Description of the error.
        cause: String,
    },

    /// YAML parsing failed.
    #[error("D505: Failed to parse YAML at {path}: {cause}")]
    YamlParse {
        /// The YAML file.
        path: PathBuf,
        /// Parser message.
        cause: String,
    },
}

/// Coarse error classes used by the outward API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown component, app, prop or package.
    NotFound,
    /// Boot or RPC deadline exceeded.
    Timeout,
    /// Execution unit exited or faulted mid-call.
    UnitCrashed,
    /// Definition missing required fields.
    DefinitionInvalid,
    /// Dependency installation failed.
    DependencyInstallFailed,
    /// Connector code raised an error.
    InvocationFailed,
    /// Everything else.
    Internal,
}

impl DockyardError {
    /// Get the error code (e.g., "D101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ComponentNotFound { .. } => "D101",
            Self::AppNotFound { .. } => "D102",
            Self::PropNotFound { .. } => "D103",
            Self::PackageNotFound { .. } => "D104",
            Self::BootTimeout { .. } => "D201",
            Self::RpcTimeout { .. } => "D202",
            Self::UnitCrashed { .. } => "D203",
            Self::UnitLaunch { .. } => "D204",
            Self::ShuttingDown => "D205",
            Self::DefinitionInvalid { .. } => "D301",
            Self::MissingEntryPoint { .. } => "D302",
            Self::DuplicateComponentKey { .. } => "D303",
            Self::DependencyInstallFailed { .. } => "D304",
            Self::InvocationFailed { .. } => "D401",
            Self::Protocol { .. } => "D501",
            Self::Serialization { .. } => "D502",
            Self::ConfigValue { .. } => "D503",
            Self::Io { .. } => "D504",
            Self::YamlParse { .. } => "D505",
        }
    }

    /// Classify this error for the outward API layer.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ComponentNotFound { .. }
            | Self::AppNotFound { .. }
            | Self::PropNotFound { .. }
            | Self::PackageNotFound { .. } => ErrorKind::NotFound,
            Self::BootTimeout { .. } | Self::RpcTimeout { .. } => ErrorKind::Timeout,
            Self::UnitCrashed { .. } | Self::UnitLaunch { .. } | Self::ShuttingDown => {
                ErrorKind::UnitCrashed
            }
            Self::DefinitionInvalid { .. }
            | Self::MissingEntryPoint { .. }
            | Self::DuplicateComponentKey { .. } => ErrorKind::DefinitionInvalid,
            Self::DependencyInstallFailed { .. } => ErrorKind::DependencyInstallFailed,
            Self::InvocationFailed { .. } => ErrorKind::InvocationFailed,
            Self::Protocol { .. }
            | Self::Serialization { .. }
            | Self::ConfigValue { .. }
            | Self::Io { .. }
            | Self::YamlParse { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error is a boot or RPC timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// Check if this error is retriable. Retrying is left to the caller.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::BootTimeout { .. } | Self::RpcTimeout { .. } | Self::UnitCrashed { .. }
        )
    }
}

impl From<serde_json::Error> for DockyardError {
    fn from(e: serde_json::Error) -> Self {
        DockyardError::Serialization {
            cause: e.to_string(),
        }
    }
}

/// Result type alias using `DockyardError`.
pub type Result<T> = std::result::Result<T, DockyardError>;
