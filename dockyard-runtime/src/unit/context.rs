//! Execution context construction.
//!
//! Built per invocation inside the unit: binds the caller's credential,
//! exposes the app's methods through an `AppMethods` capability bound to
//! that credential, and owns the export bag merged into the result.

use super::index::UnitIndex;
use crate::normalize::{PropResolution, resolve_prop};
use dockyard_core::connector::{AppMethods, Exports, OptionsContext, RunContext};
use dockyard_core::credential::Credential;
use dockyard_core::definition::ComponentDefinition;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builds the per-invocation contexts handed to connector code.
pub struct ExecutionContextBuilder<'a> {
    index: &'a UnitIndex,
    user_id: String,
    credential: Credential,
    exports: Exports,
}

impl<'a> ExecutionContextBuilder<'a> {
    /// Start a context for one caller.
    pub fn new(index: &'a UnitIndex, user_id: impl Into<String>, credential: Credential) -> Self {
        Self {
            index,
            user_id: user_id.into(),
            credential,
            exports: Exports::new(),
        }
    }

    /// The export bag shared by every context this builder produces.
    pub fn exports(&self) -> Exports {
        self.exports.clone()
    }

    /// The app's methods bound to this caller.
    pub fn app_methods(&self) -> AppMethods {
        let methods = self
            .index
            .module()
            .map(|m| m.methods())
            .unwrap_or_else(|| Arc::new(BTreeMap::new()));
        AppMethods::bind(
            self.index.slug(),
            methods,
            self.credential.clone(),
            self.exports.clone(),
        )
    }

    /// Context for running `component` with the caller's input.
    pub fn run_context(&self, component: &ComponentDefinition, input: &Map<String, Value>) -> RunContext {
        RunContext {
            slug: self.index.slug().to_string(),
            component_key: component.key.clone(),
            user_id: self.user_id.clone(),
            props: bind_props(self.index, component, input),
            credential: self.credential.clone(),
            app: self.app_methods(),
            exports: self.exports.clone(),
        }
    }

    /// Context for resolving the options of `prop_name`.
    pub fn options_context(
        &self,
        component: &ComponentDefinition,
        prop_name: &str,
        configured_props: Map<String, Value>,
        prev_context: Option<Value>,
    ) -> OptionsContext {
        OptionsContext {
            slug: self.index.slug().to_string(),
            component_key: component.key.clone(),
            prop_name: prop_name.to_string(),
            user_id: self.user_id.clone(),
            configured_props,
            prev_context,
            credential: self.credential.clone(),
            app: self.app_methods(),
            exports: self.exports.clone(),
        }
    }
}

/// Copy the declared props present in `input`; absent ones take their
/// default. Undeclared input fields are ignored.
pub fn bind_props(
    index: &UnitIndex,
    component: &ComponentDefinition,
    input: &Map<String, Value>,
) -> Map<String, Value> {
    let mut props = Map::new();
    for declared in &component.props {
        if let Some(value) = input.get(&declared.name) {
            props.insert(declared.name.clone(), value.clone());
            continue;
        }
        let default = match resolve_prop(index.app(), component, declared) {
            PropResolution::Resolved(raw) => raw.default.clone(),
            PropResolution::Unresolved { .. } => None,
        };
        if let Some(default) = default {
            props.insert(declared.name.clone(), default);
        }
    }
    props
}

/// Merge a return value with the exports. Exports win on collision; a
/// non-object value is placed under `data`.
pub fn merge_result(value: Value, exports: Map<String, Value>) -> Value {
    let mut merged = match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    merged.extend(exports);
    Value::Object(merged)
}
