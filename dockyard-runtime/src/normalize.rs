//! Metadata normalization.
//!
//! Turns the raw definitions a unit announces into flat, stable metadata.
//! Prop references are dereferenced (app prop definitions first, then the
//! component's own), fields set on the referencing prop override the
//! definition, and internal fields such as resolver and entry point names
//! are dropped.

use dockyard_core::definition::{AppDefinition, ComponentDefinition, NamedProp, RawProp};
use dockyard_core::metadata::{AppMetadata, ComponentMetadata, PropOption, PropSpec, UnitManifest};
use std::borrow::Cow;

/// How a declared prop resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum PropResolution<'a> {
    /// The prop is self-contained or its reference resolved.
    Resolved(Cow<'a, RawProp>),
    /// The prop references a definition that does not exist.
    Unresolved {
        /// The definition name that was looked up.
        target: String,
    },
}

/// Look up a reusable prop definition: app first, then the component.
pub fn find_prop_definition<'a>(
    app: Option<&'a AppDefinition>,
    component: &'a ComponentDefinition,
    name: &str,
) -> Option<&'a RawProp> {
    app.and_then(|a| a.prop_definition(name))
        .or_else(|| component.prop_definitions.get(name))
}

/// Resolve a declared prop against the available prop definitions.
pub fn resolve_prop<'a>(
    app: Option<&'a AppDefinition>,
    component: &'a ComponentDefinition,
    prop: &'a NamedProp,
) -> PropResolution<'a> {
    let Some(target) = prop
        .prop
        .prop_definition
        .as_ref()
        .and_then(|r| r.target(&prop.name))
    else {
        return PropResolution::Resolved(Cow::Borrowed(&prop.prop));
    };

    match find_prop_definition(app, component, target) {
        Some(definition) => PropResolution::Resolved(Cow::Owned(prop.prop.overlay(definition))),
        None => PropResolution::Unresolved {
            target: target.to_string(),
        },
    }
}

/// Resolve the declaration governing `prop_name` on a component.
///
/// Declared props are resolved through their reference. A plain declaration
/// with no resolver of its own, like an undeclared name, defers to a prop
/// definition of the same name. Returns `None` when nothing describes the
/// prop.
pub fn governing_prop<'a>(
    app: Option<&'a AppDefinition>,
    component: &'a ComponentDefinition,
    prop_name: &str,
) -> Option<Cow<'a, RawProp>> {
    let by_name = || find_prop_definition(app, component, prop_name).map(Cow::Borrowed);
    let Some(declared) = component.prop(prop_name) else {
        return by_name();
    };
    if declared.prop.prop_definition.is_none() && declared.prop.options_resolver.is_none() {
        return by_name().or(Some(Cow::Borrowed(&declared.prop)));
    }
    match resolve_prop(app, component, declared) {
        PropResolution::Resolved(raw) => Some(raw),
        PropResolution::Unresolved { .. } => None,
    }
}

/// Build a [`PropSpec`] from a resolved declaration.
pub fn prop_spec(name: &str, raw: &RawProp) -> PropSpec {
    PropSpec {
        name: name.to_string(),
        prop_type: raw.prop_type.clone().unwrap_or_else(|| "string".to_string()),
        app: raw.app.clone(),
        label: raw.label.clone().unwrap_or_else(|| name.to_string()),
        description: raw.description.clone().unwrap_or_default(),
        optional: raw.optional.unwrap_or(false),
        default: raw.default.clone(),
        reload_props: raw.reload_props.unwrap_or(false),
        remote_options: raw.is_dynamic(),
        options: raw
            .options
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(PropOption::from)
            .collect(),
    }
}

/// Normalize one component.
pub fn normalize_component(
    slug: &str,
    app: Option<&AppDefinition>,
    component: &ComponentDefinition,
) -> ComponentMetadata {
    let configurable_props = component
        .props
        .iter()
        .map(|prop| match resolve_prop(app, component, prop) {
            PropResolution::Resolved(raw) => prop_spec(&prop.name, &raw),
            PropResolution::Unresolved { target } => {
                tracing::warn!(
                    slug = %slug,
                    key = %component.key,
                    prop = %prop.name,
                    definition = %target,
                    "Prop references an unknown prop definition"
                );
                PropSpec::named(&prop.name)
            }
        })
        .collect();

    ComponentMetadata {
        key: component.key.clone(),
        name: component.display_name().to_string(),
        description: component.description.clone().unwrap_or_default(),
        version: component.version.clone(),
        component_type: component.component_type,
        app: slug.to_string(),
        configurable_props,
    }
}

/// Derive app metadata from the slug, app definition and manifest.
pub fn normalize_app(unit: &UnitManifest) -> AppMetadata {
    let slug = unit.slug.as_str();
    let app_name = unit
        .app
        .as_ref()
        .and_then(|a| a.app.as_deref())
        .filter(|n| !n.is_empty())
        .unwrap_or(slug);

    let mut meta = AppMetadata {
        id: app_name.to_string(),
        name_slug: app_name.to_string(),
        name: app_name.to_string(),
        description: String::new(),
        version: unit.manifest.version.clone(),
        img_src: None,
        categories: Vec::new(),
        custom_fields_json: "[]".to_string(),
        auth_type: unit
            .app
            .as_ref()
            .and_then(|a| a.auth_type.clone())
            .unwrap_or_else(|| "none".to_string()),
    };

    if let Some(description) = unit
        .manifest
        .description
        .clone()
        .or_else(|| unit.app.as_ref().and_then(|a| a.description.clone()))
    {
        meta.description = description;
    }

    if let Some(overrides) = &unit.manifest.metadata {
        if let Some(v) = &overrides.img_src {
            meta.img_src = Some(v.clone());
        }
        if let Some(v) = &overrides.categories {
            meta.categories = v.clone();
        }
        if let Some(v) = &overrides.custom_fields_json {
            meta.custom_fields_json = v.clone();
        }
        if let Some(v) = &overrides.description {
            meta.description = v.clone();
        }
        if let Some(v) = &overrides.id {
            meta.id = v.clone();
        }
        if let Some(v) = &overrides.name_slug {
            meta.name_slug = v.clone();
        }
        if let Some(v) = &overrides.name {
            meta.name = v.clone();
        }
        if let Some(v) = &overrides.auth_type {
            meta.auth_type = v.clone();
        }
    }

    meta
}

/// Normalize everything a unit announced.
pub fn normalize_unit(unit: &UnitManifest) -> (AppMetadata, Vec<ComponentMetadata>) {
    let app = normalize_app(unit);
    let components = unit
        .components
        .iter()
        .map(|c| normalize_component(&unit.slug, unit.app.as_ref(), c))
        .collect();
    (app, components)
}
