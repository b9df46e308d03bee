//! Action and trigger definitions.

use super::prop::{NamedProp, RawProp, ordered_props};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether a component is an action or a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// Invoked on demand.
    Action,
    /// Emits events.
    Trigger,
}

impl ComponentType {
    /// Folder holding definitions of this type inside a package.
    pub fn folder(&self) -> &'static str {
        match self {
            Self::Action => "actions",
            Self::Trigger => "triggers",
        }
    }

    /// Folder names accepted for this type, preferred first.
    pub fn folders(&self) -> &'static [&'static str] {
        match self {
            Self::Action => &["actions"],
            Self::Trigger => &["triggers", "sources"],
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action => write!(f, "action"),
            Self::Trigger => write!(f, "trigger"),
        }
    }
}

fn default_version() -> String {
    "0.0.1".to_string()
}

/// A component as declared on disk.
///
/// ```yaml
/// key: get_forecast
/// name: Get Forecast
/// version: 0.1.0
/// props:
///   city:
///     type: string
///     default: NYC
///   units:
///     prop_definition: true
/// run: get_forecast
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    /// Registry-wide unique key. Definitions with an empty key are skipped.
    #[serde(default)]
    pub key: String,
    /// Display name. Defaults to the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Component version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Declared props, in declaration order.
    #[serde(default, deserialize_with = "ordered_props")]
    pub props: Vec<NamedProp>,
    /// Component-local reusable prop definitions.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prop_definitions: BTreeMap<String, RawProp>,
    /// Entry point name in the connector module. Defaults to the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    /// Filled in by the loader from the folder the file was found in.
    #[serde(default = "default_component_type", rename = "type")]
    pub component_type: ComponentType,
}

fn default_component_type() -> ComponentType {
    ComponentType::Action
}

impl ComponentDefinition {
    /// Whether the definition carries a usable key.
    pub fn has_key(&self) -> bool {
        !self.key.trim().is_empty()
    }

    /// Entry point name bound at invocation time.
    pub fn entry_point(&self) -> &str {
        self.run
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(&self.key)
    }

    /// Look up a declared prop by name.
    pub fn prop(&self, name: &str) -> Option<&NamedProp> {
        self.props.iter().find(|p| p.name == name)
    }

    /// Display name, falling back to the key.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_component_with_defaults() {
        let yaml = r#"
key: hello_world
props:
  name:
    type: string
    default: World
"#;
        let def: ComponentDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.has_key());
        assert_eq!(def.version, "0.0.1");
        assert_eq!(def.entry_point(), "hello_world");
        assert_eq!(def.display_name(), "hello_world");
        assert_eq!(def.component_type, ComponentType::Action);
        assert!(def.prop("name").is_some());
        assert!(def.prop("missing").is_none());
    }

    #[test]
    fn explicit_entry_point_wins() {
        let def: ComponentDefinition =
            serde_yaml::from_str("key: scrape\nrun: scrape_search\n").unwrap();
        assert_eq!(def.entry_point(), "scrape_search");
    }

    #[test]
    fn missing_key_is_detected() {
        let def: ComponentDefinition = serde_yaml::from_str("name: Nameless\n").unwrap();
        assert!(!def.has_key());
    }

    #[test]
    fn survives_json_transport() {
        let yaml = "key: k\nprops:\n  b: {}\n  a: { optional: true }\n";
        let def: ComponentDefinition = serde_yaml::from_str(yaml).unwrap();
        let json = serde_json::to_string(&def).unwrap();
        let back: ComponentDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, def);
        assert_eq!(back.props[0].name, "b");
    }

    #[test]
    fn trigger_folders_include_legacy_alias() {
        assert_eq!(ComponentType::Trigger.folders(), &["triggers", "sources"]);
        assert_eq!(ComponentType::Action.folder(), "actions");
    }
}
