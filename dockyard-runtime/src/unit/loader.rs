//! Boot-time package loading inside an execution unit.

use super::index::UnitIndex;
use dockyard_core::connector::ConnectorCatalog;
use dockyard_core::definition::{
    AppDefinition, ComponentDefinition, ComponentType, PackageManifest, is_definition_file,
    is_test_event, read_yaml,
};
use dockyard_core::error::{DockyardError, Result};
use dockyard_core::metadata::UnitManifest;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Load a package directory into a unit index.
///
/// Manifest, app definition and boot hook failures abort the boot.
/// Individual component definitions that fail to parse or lack a key are
/// skipped with a warning.
pub fn load_package(slug: &str, dir: &Path, catalog: &ConnectorCatalog) -> Result<UnitIndex> {
    if !dir.is_dir() {
        return Err(DockyardError::PackageNotFound {
            slug: slug.to_string(),
            path: dir.to_path_buf(),
        });
    }

    let manifest = PackageManifest::load(dir)?;
    let app = load_app(slug, dir, &manifest)?;

    let module = catalog.get(slug);
    match &module {
        Some(module) => {
            if let Some(hook) = module.boot_hook() {
                hook().map_err(|e| DockyardError::UnitCrashed {
                    slug: slug.to_string(),
                    cause: format!("boot hook failed: {}", e),
                })?;
            }
        }
        None => {
            tracing::info!(slug = %slug, "No compiled module for package; components have no entry points");
        }
    }

    let mut components = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped = 0usize;

    for component_type in [ComponentType::Action, ComponentType::Trigger] {
        for path in definition_files(dir, component_type) {
            match load_component(&path, component_type) {
                Ok(component) => {
                    if !seen.insert(component.key.clone()) {
                        tracing::warn!(
                            slug = %slug,
                            key = %component.key,
                            path = %path.display(),
                            "Duplicate component key in package; keeping the first definition"
                        );
                        skipped += 1;
                        continue;
                    }
                    if let Some(module) = &module {
                        if module.entry_point(component.entry_point()).is_none() {
                            tracing::debug!(
                                slug = %slug,
                                key = %component.key,
                                entry_point = component.entry_point(),
                                "Component has no compiled entry point"
                            );
                        }
                    }
                    components.push(component);
                }
                Err(e) => {
                    tracing::warn!(
                        slug = %slug,
                        path = %path.display(),
                        error = %e,
                        "Skipping component definition"
                    );
                    skipped += 1;
                }
            }
        }
    }

    tracing::debug!(
        slug = %slug,
        components = components.len(),
        skipped,
        "Package loaded"
    );

    let manifest = UnitManifest {
        slug: slug.to_string(),
        manifest,
        app,
        components,
    };
    Ok(UnitIndex::new(manifest, module))
}

fn load_app(slug: &str, dir: &Path, manifest: &PackageManifest) -> Result<Option<AppDefinition>> {
    let path = dir.join(manifest.app_file());
    if path.is_file() {
        return read_yaml(&path).map(Some);
    }
    if manifest.main.is_some() {
        tracing::warn!(
            slug = %slug,
            path = %path.display(),
            "Manifest names an app definition that does not exist"
        );
    }
    Ok(None)
}

fn load_component(path: &Path, component_type: ComponentType) -> Result<ComponentDefinition> {
    let mut component: ComponentDefinition = read_yaml(path)?;
    if !component.has_key() {
        return Err(DockyardError::DefinitionInvalid {
            path: path.to_path_buf(),
            cause: "definition has no key".to_string(),
        });
    }
    component.key = component.key.trim().to_string();
    component.component_type = component_type;
    Ok(component)
}

/// Definition files for one component type, in a stable order.
///
/// A definition is either a YAML file directly inside the folder or the
/// first YAML file (by name) inside a per-component subdirectory.
fn definition_files(dir: &Path, component_type: ComponentType) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for folder in component_type.folders() {
        let root = dir.join(folder);
        for entry in sorted_entries(&root) {
            if entry.is_dir() {
                if let Some(file) = sorted_entries(&entry)
                    .into_iter()
                    .find(|p| p.is_file() && is_candidate(p))
                {
                    files.push(file);
                }
            } else if is_candidate(&entry) {
                files.push(entry);
            }
        }
    }
    files
}

fn is_candidate(path: &Path) -> bool {
    is_definition_file(path) && !is_test_event(path)
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let Ok(read) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut entries: Vec<PathBuf> = read.filter_map(|e| e.ok().map(|e| e.path())).collect();
    entries.sort();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockyard_core::connector::{ConnectorError, ConnectorModule};
    use std::fs;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn scans_actions_triggers_and_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("app.yaml"), "app: weather\n");
        write(&root.join("actions/get_forecast.yaml"), "key: get_forecast\n");
        write(&root.join("actions/alerts/alerts.yaml"), "key: list_alerts\n");
        write(&root.join("actions/alerts/test-event.yaml"), "key: not_a_component\n");
        write(&root.join("actions/README.md"), "docs");
        write(&root.join("sources/new_alert/new_alert.yml"), "key: new_alert\n");

        let index = load_package("weather", root, &ConnectorCatalog::new()).unwrap();
        let keys = index.component_index();
        assert_eq!(keys.actions, vec!["list_alerts", "get_forecast"]);
        assert_eq!(keys.triggers, vec!["new_alert"]);
        assert_eq!(
            index.component("new_alert").unwrap().component_type,
            ComponentType::Trigger
        );
        assert_eq!(index.app().unwrap().app.as_deref(), Some("weather"));
        assert!(index.module().is_none());
    }

    #[test]
    fn bad_definitions_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(&root.join("actions/a.yaml"), "key: good\n");
        write(&root.join("actions/b.yaml"), "name: no key here\n");
        write(&root.join("actions/c.yaml"), "key: [broken\n");
        write(&root.join("actions/d.yaml"), "key: good\nname: second\n");

        let index = load_package("pkg", root, &ConnectorCatalog::new()).unwrap();
        assert_eq!(index.component_index().actions, vec!["good"]);
        assert!(index.component("good").unwrap().name.is_none());
    }

    #[test]
    fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_package("ghost", &dir.path().join("ghost"), &ConnectorCatalog::new())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn broken_app_definition_fails_boot() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("app.yaml"), "prop_definitions: [oops\n");
        assert!(load_package("pkg", dir.path(), &ConnectorCatalog::new()).is_err());
    }

    #[test]
    fn manifest_main_selects_app_file() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("connector.yaml"), "main: custom.yaml\n");
        write(&dir.path().join("custom.yaml"), "app: custom\n");
        write(&dir.path().join("app.yaml"), "app: ignored\n");

        let index = load_package("pkg", dir.path(), &ConnectorCatalog::new()).unwrap();
        assert_eq!(index.app().unwrap().app.as_deref(), Some("custom"));
    }

    #[test]
    fn failing_boot_hook_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ConnectorCatalog::new().with_module(
            ConnectorModule::builder("pkg")
                .on_boot(|| Err(ConnectorError::new("no network")))
                .build(),
        );
        let err = load_package("pkg", dir.path(), &catalog).unwrap_err();
        assert!(err.to_string().contains("no network"));
    }
}
