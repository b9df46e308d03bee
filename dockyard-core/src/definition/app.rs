//! App definition: connector-level configuration shared by all components.

use super::prop::RawProp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Connector-level definition.
///
/// Shared methods are not declared here; they are compiled into the
/// connector module and exposed to components through `AppMethods`.
///
/// ```yaml
/// app: weather
/// name: Weather
/// auth_type: keys
/// prop_definitions:
///   units:
///     type: string
///     label: Units
///     options_resolver: list_units
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppDefinition {
    /// App name. Overrides the slug-derived id, name and name slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Human readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Authentication scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    /// Reusable prop definitions, referenced from component props.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub prop_definitions: BTreeMap<String, RawProp>,
}

impl AppDefinition {
    /// Look up a reusable prop definition.
    pub fn prop_definition(&self, name: &str) -> Option<&RawProp> {
        self.prop_definitions.get(name)
    }
}
