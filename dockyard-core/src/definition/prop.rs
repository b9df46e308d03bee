//! Prop declarations as written in component and app definitions.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// A reference from a prop to a reusable prop definition.
///
/// ```yaml
/// props:
///   city:
///     prop_definition: true        # look up "city"
///   region:
///     prop_definition: area_code   # look up "area_code"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropReference {
    /// `true` references the definition named like the prop itself.
    Flag(bool),
    /// References a definition by name.
    Named(String),
}

impl PropReference {
    /// The definition name this reference points at, if it is active.
    pub fn target<'a>(&'a self, prop_name: &'a str) -> Option<&'a str> {
        match self {
            Self::Flag(true) => Some(prop_name),
            Self::Flag(false) => None,
            Self::Named(name) if name.is_empty() => Some(prop_name),
            Self::Named(name) => Some(name),
        }
    }
}

/// A static option as declared on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawOption {
    /// `{ label: "Celsius", value: "metric" }`
    Labeled {
        /// Display label.
        label: String,
        /// Submitted value.
        value: Value,
    },
    /// A bare value used as its own label.
    Plain(Value),
}

/// A prop as declared, before references are resolved.
///
/// Every field is optional here; normalization fills in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProp {
    /// Semantic type (`string`, `integer`, `boolean`, `app`, ...).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub prop_type: Option<String>,
    /// App slug for `app`-typed props.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Help text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the prop may be omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    /// Value used when the prop is absent from the input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether changing this prop should reload the prop form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_props: Option<bool>,
    /// Static options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<RawOption>>,
    /// Reference to a reusable prop definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prop_definition: Option<PropReference>,
    /// Name of the compiled options resolver. Makes the prop dynamic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options_resolver: Option<String>,
}

impl RawProp {
    /// A definition is dynamic when it names an options resolver.
    pub fn is_dynamic(&self) -> bool {
        self.options_resolver
            .as_deref()
            .is_some_and(|name| !name.is_empty())
    }

    /// Layer the fields set on `self` over `base`.
    ///
    /// Used when a referencing prop overrides parts of the definition it
    /// points at. The reference itself is dropped from the result.
    pub fn overlay(&self, base: &RawProp) -> RawProp {
        RawProp {
            prop_type: self.prop_type.clone().or_else(|| base.prop_type.clone()),
            app: self.app.clone().or_else(|| base.app.clone()),
            label: self.label.clone().or_else(|| base.label.clone()),
            description: self
                .description
                .clone()
                .or_else(|| base.description.clone()),
            optional: self.optional.or(base.optional),
            default: self.default.clone().or_else(|| base.default.clone()),
            reload_props: self.reload_props.or(base.reload_props),
            options: self.options.clone().or_else(|| base.options.clone()),
            prop_definition: None,
            options_resolver: self
                .options_resolver
                .clone()
                .or_else(|| base.options_resolver.clone()),
        }
    }
}

/// A prop paired with its declared name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedProp {
    /// Prop name, unique within a component.
    pub name: String,
    /// The declaration.
    #[serde(flatten)]
    pub prop: RawProp,
}

impl NamedProp {
    /// Create a named prop.
    pub fn new(name: impl Into<String>, prop: RawProp) -> Self {
        Self {
            name: name.into(),
            prop,
        }
    }
}

/// Deserialize a prop table in declaration order.
///
/// Accepts the on-disk map form (`name: {...}`) as well as the list form
/// (`[{name: ..., ...}]`) used on the wire. A null table is empty.
pub fn ordered_props<'de, D>(deserializer: D) -> Result<Vec<NamedProp>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PropsVisitor;

    impl<'de> Visitor<'de> for PropsVisitor {
        type Value = Vec<NamedProp>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of prop names to props or a list of named props")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut props = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, prop)) = map.next_entry::<String, Option<RawProp>>()? {
                if props.iter().any(|p: &NamedProp| p.name == name) {
                    return Err(de::Error::custom(format!("duplicate prop '{}'", name)));
                }
                props.push(NamedProp::new(name, prop.unwrap_or_default()));
            }
            Ok(props)
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut props = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(prop) = seq.next_element::<NamedProp>()? {
                props.push(prop);
            }
            Ok(props)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(PropsVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Table {
        #[serde(deserialize_with = "ordered_props")]
        props: Vec<NamedProp>,
    }

    #[test]
    fn map_form_keeps_declaration_order() {
        let yaml = r#"
props:
  zeta:
    type: string
  alpha:
    type: integer
  mid: {}
"#;
        let table: Table = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<_> = table.props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(table.props[1].prop.prop_type.as_deref(), Some("integer"));
    }

    #[test]
    fn list_form_is_accepted() {
        let json = r#"{"props": [{"name": "city", "default": "NYC"}]}"#;
        let table: Table = serde_json::from_str(json).unwrap();
        assert_eq!(table.props[0].name, "city");
        assert_eq!(table.props[0].prop.default, Some(Value::from("NYC")));
    }

    #[test]
    fn null_prop_body_is_empty_prop() {
        let table: Table = serde_yaml::from_str("props:\n  bare:\n").unwrap();
        assert_eq!(table.props[0].prop, RawProp::default());
    }

    #[test]
    fn duplicate_prop_names_are_rejected() {
        let json = r#"{"props": {"a": {}, "a": {}}}"#;
        assert!(serde_json::from_str::<Table>(json).is_err());
    }

    #[test]
    fn reference_targets() {
        assert_eq!(PropReference::Flag(true).target("q"), Some("q"));
        assert_eq!(PropReference::Flag(false).target("q"), None);
        assert_eq!(
            PropReference::Named("query".to_string()).target("q"),
            Some("query")
        );
    }

    #[test]
    fn overlay_prefers_referencing_fields() {
        let base = RawProp {
            label: Some("Query".to_string()),
            description: Some("Search terms".to_string()),
            options_resolver: Some("suggest".to_string()),
            ..Default::default()
        };
        let over = RawProp {
            label: Some("Search".to_string()),
            prop_definition: Some(PropReference::Flag(true)),
            ..Default::default()
        };

        let merged = over.overlay(&base);
        assert_eq!(merged.label.as_deref(), Some("Search"));
        assert_eq!(merged.description.as_deref(), Some("Search terms"));
        assert!(merged.is_dynamic());
        assert!(merged.prop_definition.is_none());
    }

    #[test]
    fn options_accept_plain_and_labeled() {
        let prop: RawProp =
            serde_yaml::from_str("options:\n  - metric\n  - { label: Imperial, value: imperial }\n")
                .unwrap();
        let options = prop.options.unwrap();
        assert_eq!(options[0], RawOption::Plain(Value::from("metric")));
        assert!(matches!(options[1], RawOption::Labeled { .. }));
    }
}
