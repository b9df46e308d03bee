//! The registry facade.
//!
//! [`ConnectorRegistry`] is the host-side object the rest of the system
//! calls. It prepares packages, launches one execution unit per package,
//! waits for each unit's `ready` event, normalizes the announced metadata
//! and keeps the merged index of apps and components. Option resolution
//! and component runs are forwarded to the owning unit over its channel
//! with the caller's credential attached.
//!
//! The registry is an explicit value: share it with `Arc` or clone it
//! (clones share the same state).

mod live;
mod metrics;

pub use live::{FailedPackage, LiveUnit, LoadReport};
pub use metrics::{MetricsSnapshot, RegistryMetrics};

use crate::channel::{BootSignal, PendingTable, UnitConnection, spawn_reader};
use crate::config::HostConfig;
use crate::normalize::normalize_unit;
use crate::preparer::{PackagePreparer, PrepareOutcome};
use crate::unit::{ThreadLauncher, UnitLauncher, UnitSpec};
use dashmap::DashMap;
use dockyard_core::connector::ConnectorCatalog;
use dockyard_core::credential::{Credential, CredentialStore, MemoryCredentialStore};
use dockyard_core::error::{DockyardError, Result};
use dockyard_core::metadata::{AppMetadata, ComponentIndex, ComponentMetadata, OptionsPage};
use dockyard_core::protocol::{Operation, PropOptionsArgs, RunArgs};
use dockyard_core::types::Generation;
use live::ComponentEntry;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;

/// Host-side registry of live execution units.
#[derive(Clone)]
pub struct ConnectorRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    config: HostConfig,
    catalog: Arc<ConnectorCatalog>,
    launcher: Arc<dyn UnitLauncher>,
    preparer: PackagePreparer,
    credentials: Arc<dyn CredentialStore>,
    units: DashMap<String, LiveUnit>,
    components: DashMap<String, ComponentEntry>,
    /// Serializes commits and purges so the two maps change together.
    commit_lock: Mutex<()>,
    next_generation: AtomicU64,
    metrics: RegistryMetrics,
    shutting_down: AtomicBool,
}

impl ConnectorRegistry {
    /// Start building a registry.
    pub fn builder() -> ConnectorRegistryBuilder {
        ConnectorRegistryBuilder::default()
    }

    /// Host configuration in use.
    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    /// Counters since the registry was created.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register (or re-register) the package stored under `slug`.
    ///
    /// Prepares the package, launches its unit and waits for `ready` within
    /// the boot timeout. Re-registering a live slug replaces the old unit.
    /// Fails with `DuplicateComponentKey` if another package already owns
    /// one of the announced component keys.
    pub async fn register_package(&self, slug: &str) -> Result<AppMetadata> {
        let inner = &self.inner;
        if inner.shutting_down.load(Ordering::Acquire) {
            return Err(DockyardError::ShuttingDown);
        }

        let result = self.boot_and_commit(slug).await;
        if let Err(e) = &result {
            inner.metrics.record_boot_failure(e.is_timeout());
            tracing::warn!(slug = %slug, error = %e, "Package registration failed");
        }
        result
    }

    async fn boot_and_commit(&self, slug: &str) -> Result<AppMetadata> {
        let inner = &self.inner;
        let package_dir = inner.package_dir(slug)?;

        match inner.preparer.prepare(slug, &package_dir).await {
            PrepareOutcome::Installed => {
                tracing::info!(slug = %slug, "Package dependencies installed");
            }
            PrepareOutcome::InstallFailed(cause) => {
                tracing::warn!(slug = %slug, cause = %cause, "Continuing without installed dependencies");
            }
            PrepareOutcome::NoDependencies => {}
        }

        let generation = Generation::new(inner.next_generation.fetch_add(1, Ordering::Relaxed) + 1);
        let channel = inner.launcher.launch(UnitSpec {
            slug: slug.to_string(),
            generation,
            package_dir,
            catalog: Arc::clone(&inner.catalog),
        })?;
        tracing::debug!(
            slug = %slug,
            generation = %generation,
            launcher = inner.launcher.name(),
            "Execution unit launched"
        );

        let pending = Arc::new(PendingTable::new(slug));
        let (boot_tx, boot_rx) = oneshot::channel::<BootSignal>();
        let on_exit = {
            let weak: Weak<RegistryInner> = Arc::downgrade(&self.inner);
            let slug = slug.to_string();
            move |cause: String| {
                if let Some(inner) = weak.upgrade() {
                    inner.purge(&slug, generation, &cause);
                }
            }
        };
        spawn_reader(
            slug.to_string(),
            generation,
            channel.inbound,
            Arc::clone(&pending),
            boot_tx,
            on_exit,
        );
        let connection = UnitConnection::new(
            slug,
            generation,
            channel.outbound,
            pending,
            inner.config.rpc_timeout,
        );

        let boot_timeout = inner.config.boot_timeout;
        let manifest = match tokio::time::timeout(boot_timeout, boot_rx).await {
            Ok(Ok(Ok(manifest))) => manifest,
            Ok(Ok(Err(cause))) => {
                return Err(DockyardError::UnitCrashed {
                    slug: slug.to_string(),
                    cause,
                });
            }
            Ok(Err(_)) => {
                return Err(DockyardError::UnitCrashed {
                    slug: slug.to_string(),
                    cause: "boot signal dropped".to_string(),
                });
            }
            Err(_) => {
                connection.shutdown();
                return Err(DockyardError::BootTimeout {
                    slug: slug.to_string(),
                    timeout_ms: boot_timeout.as_millis() as u64,
                });
            }
        };

        let (app, components) = normalize_unit(&manifest);
        let live = LiveUnit {
            connection: connection.clone(),
            app: app.clone(),
            actions: manifest.index().actions,
            triggers: manifest.index().triggers,
        };

        let replaced = match inner.commit(slug, live, components) {
            Ok(replaced) => replaced,
            Err(e) => {
                connection.shutdown();
                return Err(e);
            }
        };

        if let Some(old) = replaced {
            tracing::info!(
                slug = %slug,
                old_generation = %old.generation(),
                generation = %generation,
                "Replaced live execution unit"
            );
            old.connection.shutdown();
        }

        inner.metrics.record_boot();
        tracing::info!(
            slug = %slug,
            generation = %generation,
            app = %app.name_slug,
            "Execution unit registered"
        );
        Ok(app)
    }

    /// Discover every package in the store and register them concurrently.
    ///
    /// One package failing or timing out never blocks the others.
    pub async fn load_all(&self) -> Result<LoadReport> {
        let slugs = discover_packages(&self.inner.config.packages_dir)?;
        tracing::info!(
            packages = slugs.len(),
            dir = %self.inner.config.packages_dir.display(),
            "Loading package store"
        );

        let results = futures::future::join_all(slugs.iter().map(|slug| async move {
            (slug.clone(), self.register_package(slug).await)
        }))
        .await;

        let mut report = LoadReport::default();
        for (slug, result) in results {
            match result {
                Ok(_) => report.loaded.push(slug),
                Err(error) => report.failed.push(FailedPackage { slug, error }),
            }
        }

        tracing::info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Package store loaded"
        );
        Ok(report)
    }

    /// Remove a live unit and stop it. Its pending requests are rejected.
    pub fn unregister(&self, slug: &str) -> Result<()> {
        let removed = {
            let _guard = self.inner.commit_lock.lock();
            let removed = self.inner.units.remove(slug);
            if removed.is_some() {
                self.inner.components.retain(|_, entry| entry.slug != slug);
            }
            removed
        };

        let (_, unit) = removed.ok_or_else(|| DockyardError::AppNotFound {
            slug: slug.to_string(),
        })?;
        stop_unit(&unit, "execution unit was unregistered");
        tracing::info!(slug = %slug, generation = %unit.generation(), "Execution unit unregistered");
        Ok(())
    }

    /// Stop every unit and refuse further registrations.
    pub fn shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::Release);
        let units: Vec<LiveUnit> = {
            let _guard = self.inner.commit_lock.lock();
            let slugs: Vec<String> = self.inner.units.iter().map(|r| r.key().clone()).collect();
            let units = slugs
                .iter()
                .filter_map(|slug| self.inner.units.remove(slug).map(|(_, unit)| unit))
                .collect();
            self.inner.components.clear();
            units
        };

        for unit in &units {
            stop_unit(unit, "host is shutting down");
        }
        tracing::info!(units = units.len(), "Connector registry shut down");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Metadata for every live app, ordered by slug.
    pub async fn list_apps(&self) -> Vec<AppMetadata> {
        let mut apps: Vec<(String, AppMetadata)> = self
            .inner
            .units
            .iter()
            .map(|r| (r.key().clone(), r.value().app.clone()))
            .collect();
        apps.sort_by(|a, b| a.0.cmp(&b.0));
        apps.into_iter().map(|(_, app)| app).collect()
    }

    /// Metadata for one live app.
    pub async fn get_app(&self, slug: &str) -> Result<AppMetadata> {
        self.inner
            .units
            .get(slug)
            .map(|r| r.app.clone())
            .ok_or_else(|| DockyardError::AppNotFound {
                slug: slug.to_string(),
            })
    }

    /// Slugs of every live unit, sorted.
    pub fn live_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.inner.units.iter().map(|r| r.key().clone()).collect();
        slugs.sort();
        slugs
    }

    /// Every live action, grouped by app in slug order.
    pub async fn list_actions(&self) -> Vec<ComponentMetadata> {
        self.collect_all(|unit| unit.actions.clone())
    }

    /// Every live trigger, grouped by app in slug order.
    pub async fn list_triggers(&self) -> Vec<ComponentMetadata> {
        self.collect_all(|unit| unit.triggers.clone())
    }

    /// Actions of one app.
    pub async fn list_actions_for_app(&self, slug: &str) -> Result<Vec<ComponentMetadata>> {
        let keys = self.unit_keys(slug, |unit| unit.actions.clone())?;
        Ok(self.inner.lookup_all(&keys))
    }

    /// Triggers of one app.
    pub async fn list_triggers_for_app(&self, slug: &str) -> Result<Vec<ComponentMetadata>> {
        let keys = self.unit_keys(slug, |unit| unit.triggers.clone())?;
        Ok(self.inner.lookup_all(&keys))
    }

    /// Metadata for one component.
    pub async fn get_component(&self, key: &str) -> Result<ComponentMetadata> {
        self.inner
            .components
            .get(key)
            .map(|r| r.metadata.clone())
            .ok_or_else(|| DockyardError::ComponentNotFound {
                key: key.to_string(),
            })
    }

    /// Ask a live unit for its component index.
    pub async fn list_components(&self, slug: &str) -> Result<ComponentIndex> {
        let connection = self.connection_for_slug(slug)?;
        let value = connection.call(Operation::ListComponents).await?;
        Ok(serde_json::from_value(value)?)
    }

    // =========================================================================
    // Invocation
    // =========================================================================

    /// Resolve the options of a component prop for a user.
    ///
    /// Props without a dynamic resolver yield an empty page.
    pub async fn resolve_prop_options(
        &self,
        user_id: &str,
        component_key: &str,
        prop_name: &str,
        configured_props: Map<String, Value>,
        prev_context: Option<Value>,
    ) -> Result<OptionsPage> {
        let (slug, connection) = self.connection_for_component(component_key)?;
        let credential = self.credential(user_id, &slug).await?;
        let operation = Operation::PropOptions(PropOptionsArgs {
            component_key: component_key.to_string(),
            prop_name: prop_name.to_string(),
            user_id: user_id.to_string(),
            configured_props,
            prev_context,
            credential,
        });
        let value = self.invoke(&connection, component_key, operation).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Run a component for a user with the given input props.
    pub async fn invoke_component(
        &self,
        user_id: &str,
        component_key: &str,
        props: Map<String, Value>,
    ) -> Result<Value> {
        let (slug, connection) = self.connection_for_component(component_key)?;
        let credential = self.credential(user_id, &slug).await?;
        let operation = Operation::RunComponent(RunArgs {
            component_key: component_key.to_string(),
            props,
            user_id: user_id.to_string(),
            credential,
        });
        self.invoke(&connection, component_key, operation).await
    }

    async fn invoke(
        &self,
        connection: &UnitConnection,
        component_key: &str,
        operation: Operation,
    ) -> Result<Value> {
        let metrics = &self.inner.metrics;
        let name = operation.name();
        metrics.record_invocation();

        let result = connection.call(operation).await;
        match &result {
            Ok(_) => tracing::debug!(slug = %connection.slug(), key = %component_key, operation = name, "Invocation completed"),
            Err(e) => {
                metrics.record_invocation_failure(e.is_timeout());
                tracing::debug!(
                    slug = %connection.slug(),
                    key = %component_key,
                    operation = name,
                    error = %e,
                    "Invocation failed"
                );
            }
        }
        result
    }

    async fn credential(&self, user_id: &str, slug: &str) -> Result<Credential> {
        Ok(self
            .inner
            .credentials
            .lookup(user_id, slug)
            .await?
            .unwrap_or_default())
    }

    fn connection_for_slug(&self, slug: &str) -> Result<UnitConnection> {
        self.inner
            .units
            .get(slug)
            .map(|r| r.connection.clone())
            .ok_or_else(|| DockyardError::AppNotFound {
                slug: slug.to_string(),
            })
    }

    fn connection_for_component(&self, key: &str) -> Result<(String, UnitConnection)> {
        let not_found = || DockyardError::ComponentNotFound {
            key: key.to_string(),
        };
        let slug = self
            .inner
            .components
            .get(key)
            .map(|r| r.slug.clone())
            .ok_or_else(not_found)?;
        let connection = self
            .inner
            .units
            .get(&slug)
            .map(|r| r.connection.clone())
            .ok_or_else(not_found)?;
        Ok((slug, connection))
    }

    fn unit_keys(&self, slug: &str, pick: impl Fn(&LiveUnit) -> Vec<String>) -> Result<Vec<String>> {
        self.inner
            .units
            .get(slug)
            .map(|r| pick(r.value()))
            .ok_or_else(|| DockyardError::AppNotFound {
                slug: slug.to_string(),
            })
    }

    fn collect_all(&self, pick: impl Fn(&LiveUnit) -> Vec<String>) -> Vec<ComponentMetadata> {
        let mut groups: Vec<(String, Vec<String>)> = self
            .inner
            .units
            .iter()
            .map(|r| (r.key().clone(), pick(r.value())))
            .collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        groups
            .into_iter()
            .flat_map(|(_, keys)| self.inner.lookup_all(&keys))
            .collect()
    }
}

impl RegistryInner {
    fn package_dir(&self, slug: &str) -> Result<PathBuf> {
        let dir = self.config.packages_dir.join(slug);
        let valid = !slug.is_empty()
            && slug != "."
            && slug != ".."
            && !slug.contains(['/', '\\']);
        if !valid || !dir.is_dir() {
            return Err(DockyardError::PackageNotFound {
                slug: slug.to_string(),
                path: dir,
            });
        }
        Ok(dir)
    }

    /// Make a booted unit live. Returns the unit it replaced, if any.
    fn commit(
        &self,
        slug: &str,
        live: LiveUnit,
        components: Vec<ComponentMetadata>,
    ) -> Result<Option<LiveUnit>> {
        let _guard = self.commit_lock.lock();

        if self.shutting_down.load(Ordering::Acquire) {
            return Err(DockyardError::ShuttingDown);
        }
        if !live.connection.is_open() {
            return Err(DockyardError::UnitCrashed {
                slug: slug.to_string(),
                cause: "execution unit exited before it was registered".to_string(),
            });
        }

        for component in &components {
            if let Some(existing) = self.components.get(&component.key) {
                if existing.slug != slug {
                    return Err(DockyardError::DuplicateComponentKey {
                        key: component.key.clone(),
                        existing_slug: existing.slug.clone(),
                        slug: slug.to_string(),
                    });
                }
            }
        }

        let generation = live.generation();
        let replaced = self.units.insert(slug.to_string(), live);
        self.components.retain(|_, entry| entry.slug != slug);
        for metadata in components {
            self.components.insert(
                metadata.key.clone(),
                ComponentEntry {
                    slug: slug.to_string(),
                    generation,
                    metadata,
                },
            );
        }
        Ok(replaced)
    }

    /// Drop a unit that exited, unless it has already been replaced or
    /// removed.
    fn purge(&self, slug: &str, generation: Generation, cause: &str) {
        let removed = {
            let _guard = self.commit_lock.lock();
            let removed = self.units.remove_if(slug, |_, unit| unit.generation() == generation);
            if removed.is_some() {
                self.components
                    .retain(|_, entry| !(entry.slug == slug && entry.generation == generation));
            }
            removed
        };

        if removed.is_some() {
            self.metrics.record_crash();
            tracing::warn!(
                slug = %slug,
                generation = %generation,
                cause = %cause,
                "Live execution unit exited; re-registration required"
            );
        }
    }

    fn lookup_all(&self, keys: &[String]) -> Vec<ComponentMetadata> {
        keys.iter()
            .filter_map(|key| self.components.get(key).map(|r| r.metadata.clone()))
            .collect()
    }
}

fn stop_unit(unit: &LiveUnit, cause: &str) {
    unit.connection.pending().close_and_reject_all(cause);
    unit.connection.shutdown();
}

/// Package directories under `root`, sorted. Hidden entries are skipped.
fn discover_packages(root: &Path) -> Result<Vec<String>> {
    let read = std::fs::read_dir(root).map_err(|e| DockyardError::Io {
        path: root.to_path_buf(),
        cause: e.to_string(),
    })?;

    let mut slugs: Vec<String> = read
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect();
    slugs.sort();
    Ok(slugs)
}

/// Builder for [`ConnectorRegistry`].
#[derive(Default)]
pub struct ConnectorRegistryBuilder {
    config: Option<HostConfig>,
    catalog: Option<Arc<ConnectorCatalog>>,
    launcher: Option<Arc<dyn UnitLauncher>>,
    preparer: Option<PackagePreparer>,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl ConnectorRegistryBuilder {
    /// Set the host configuration.
    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the compiled connector catalog.
    pub fn catalog(mut self, catalog: impl Into<Arc<ConnectorCatalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Set the unit launcher. Defaults to [`ThreadLauncher`].
    pub fn launcher(mut self, launcher: Arc<dyn UnitLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Set the package preparer. Defaults to one built from the config.
    pub fn preparer(mut self, preparer: PackagePreparer) -> Self {
        self.preparer = Some(preparer);
        self
    }

    /// Set the credential store. Defaults to an empty in-memory store.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Build the registry. No package is loaded yet.
    pub fn build(self) -> ConnectorRegistry {
        let config = self.config.unwrap_or_default();
        let preparer = self
            .preparer
            .unwrap_or_else(|| PackagePreparer::from_config(&config));
        ConnectorRegistry {
            inner: Arc::new(RegistryInner {
                catalog: self.catalog.unwrap_or_default(),
                launcher: self
                    .launcher
                    .unwrap_or_else(|| Arc::new(ThreadLauncher::new())),
                preparer,
                credentials: self
                    .credentials
                    .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new())),
                units: DashMap::new(),
                components: DashMap::new(),
                commit_lock: Mutex::new(()),
                next_generation: AtomicU64::new(0),
                metrics: RegistryMetrics::default(),
                shutting_down: AtomicBool::new(false),
                config,
            }),
        }
    }
}
