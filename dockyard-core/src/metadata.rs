//! Normalized metadata published by the registry.
//!
//! These types never carry executable fields: entry point and resolver
//! names are stripped during normalization.

use crate::definition::{AppDefinition, ComponentDefinition, ComponentType, PackageManifest, RawOption};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// App-level metadata for one connector package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Stable id.
    pub id: String,
    /// URL-safe name.
    pub name_slug: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Package version, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Icon URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
    /// Catalogue categories.
    pub categories: Vec<String>,
    /// JSON-encoded custom auth fields.
    pub custom_fields_json: String,
    /// Authentication scheme.
    pub auth_type: String,
}

/// A fully resolved prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSpec {
    /// Prop name.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub prop_type: String,
    /// App slug for `app`-typed props.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Display label.
    pub label: String,
    /// Help text.
    pub description: String,
    /// Whether the prop may be omitted.
    pub optional: bool,
    /// Value used when the prop is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether changing this prop reloads the form.
    pub reload_props: bool,
    /// Whether options come from a resolver.
    pub remote_options: bool,
    /// Static options.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PropOption>,
}

impl PropSpec {
    /// A spec carrying only a name, used when a reference cannot be resolved.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            prop_type: "string".to_string(),
            app: None,
            description: String::new(),
            optional: false,
            default: None,
            reload_props: false,
            remote_options: false,
            options: Vec::new(),
        }
    }
}

/// A selectable option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropOption {
    /// Display label.
    pub label: String,
    /// Submitted value.
    pub value: Value,
}

impl PropOption {
    /// Create an option.
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Interpret a loosely shaped option value.
    ///
    /// Objects with a `label` or `value` field are read as labeled options;
    /// anything else is used as its own label.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("value") || map.contains_key("label") => {
                let value = map.remove("value").unwrap_or(Value::Null);
                let label = match map.remove("label") {
                    Some(Value::String(s)) => s,
                    Some(other) => other.to_string(),
                    None => label_for(&value),
                };
                Self { label, value }
            }
            other => Self {
                label: label_for(&other),
                value: other,
            },
        }
    }
}

impl From<RawOption> for PropOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Labeled { label, value } => Self { label, value },
            RawOption::Plain(value) => Self::from_value(value),
        }
    }
}

fn label_for(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One page of dynamically resolved options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsPage {
    /// The options.
    pub options: Vec<PropOption>,
    /// Cursor handed back as `prev_context` on the next call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl OptionsPage {
    /// An empty page.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Interpret a resolver's return value.
    ///
    /// Accepts a bare list of options, or an object whose `options` is a
    /// list, with an optional `context`. Returns `None` for any other shape.
    pub fn from_resolver_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self {
                options: items.into_iter().map(PropOption::from_value).collect(),
                context: None,
            }),
            Value::Object(mut map) => match map.remove("options") {
                Some(Value::Array(items)) => Some(Self {
                    options: items.into_iter().map(PropOption::from_value).collect(),
                    context: map.remove("context").filter(|c| !c.is_null()),
                }),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Metadata for one action or trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetadata {
    /// Registry-wide unique key.
    pub key: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Version.
    pub version: String,
    /// Action or trigger.
    pub component_type: ComponentType,
    /// Slug of the owning package.
    pub app: String,
    /// Resolved props, in declaration order.
    pub configurable_props: Vec<PropSpec>,
}

impl ComponentMetadata {
    /// Look up a resolved prop.
    pub fn prop(&self, name: &str) -> Option<&PropSpec> {
        self.configurable_props.iter().find(|p| p.name == name)
    }
}

/// Keys of every component a unit serves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentIndex {
    /// Action keys.
    pub actions: Vec<String>,
    /// Trigger keys.
    pub triggers: Vec<String>,
}

/// Bulk metadata announced by a unit when it becomes ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitManifest {
    /// Package slug.
    pub slug: String,
    /// Package manifest.
    pub manifest: PackageManifest,
    /// App definition, when the package has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<AppDefinition>,
    /// Every loaded action and trigger.
    pub components: Vec<ComponentDefinition>,
}

impl UnitManifest {
    /// Build the key index from the loaded components.
    pub fn index(&self) -> ComponentIndex {
        let mut index = ComponentIndex::default();
        for component in &self.components {
            match component.component_type {
                ComponentType::Action => index.actions.push(component.key.clone()),
                ComponentType::Trigger => index.triggers.push(component.key.clone()),
            }
        }
        index
    }
}
