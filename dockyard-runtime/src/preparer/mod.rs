//! Package preparation.
//!
//! Before a unit loads a package, any third-party dependencies its manifest
//! declares are materialized through a [`DependencyInstaller`]. Failures are
//! logged and never abort startup: the unit is spawned regardless.

mod installer;

pub use installer::{CommandInstaller, DependencyInstaller, InstallFuture, NoopInstaller};

use crate::config::HostConfig;
use dockyard_core::definition::PackageManifest;
use std::path::Path;
use std::sync::Arc;

/// Result of preparing one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// The manifest declares nothing to install.
    NoDependencies,
    /// Dependencies were installed.
    Installed,
    /// Installation failed; the package is loaded anyway.
    InstallFailed(String),
}

/// Ensures package dependencies are present before boot.
#[derive(Clone)]
pub struct PackagePreparer {
    installer: Arc<dyn DependencyInstaller>,
}

impl PackagePreparer {
    /// Create a preparer with an installer.
    pub fn new(installer: Arc<dyn DependencyInstaller>) -> Self {
        Self { installer }
    }

    /// Create a preparer that never installs anything.
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopInstaller))
    }

    /// Pick the installer described by the host configuration.
    pub fn from_config(config: &HostConfig) -> Self {
        if !config.install_enabled {
            return Self::noop();
        }
        match CommandInstaller::from_command_line(&config.install_command, config.install_timeout) {
            Some(installer) => Self::new(Arc::new(installer)),
            None => Self::noop(),
        }
    }

    /// Prepare the package at `package_dir`.
    pub async fn prepare(&self, slug: &str, package_dir: &Path) -> PrepareOutcome {
        let manifest = match PackageManifest::load(package_dir) {
            Ok(manifest) => manifest,
            Err(e) => {
                // The unit reports the broken manifest itself when it boots.
                tracing::warn!(slug = %slug, error = %e, "Could not read manifest for preparation");
                return PrepareOutcome::NoDependencies;
            }
        };

        if !manifest.has_dependencies() {
            return PrepareOutcome::NoDependencies;
        }

        tracing::info!(
            slug = %slug,
            installer = self.installer.name(),
            dependencies = manifest.dependencies.len() + manifest.peer_dependencies.len(),
            "Installing package dependencies"
        );

        match self.installer.install(slug, package_dir).await {
            Ok(()) => PrepareOutcome::Installed,
            Err(e) => {
                tracing::warn!(slug = %slug, error = %e, "Dependency install failed; loading anyway");
                PrepareOutcome::InstallFailed(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for PackagePreparer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackagePreparer")
            .field("installer", &self.installer.name())
            .finish()
    }
}
