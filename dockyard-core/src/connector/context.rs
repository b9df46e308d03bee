//! Per-invocation contexts handed to connector code.

use super::error::{ConnectorError, ConnectorResult};
use super::exports::Exports;
use super::module::{ConnectorFuture, MethodFn};
use crate::credential::Credential;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Capability surface exposing a connector's shared methods to itself.
///
/// Built fresh for every invocation and bound to that invocation's
/// credential and export bag. Connector code reaches its own methods only
/// through this value.
#[derive(Clone)]
pub struct AppMethods {
    slug: Arc<str>,
    methods: Arc<BTreeMap<String, MethodFn>>,
    credential: Credential,
    exports: Exports,
}

impl AppMethods {
    /// Bind a method table to one invocation.
    pub fn bind(
        slug: impl Into<Arc<str>>,
        methods: Arc<BTreeMap<String, MethodFn>>,
        credential: Credential,
        exports: Exports,
    ) -> Self {
        Self {
            slug: slug.into(),
            methods,
            credential,
            exports,
        }
    }

    /// A surface with no methods.
    pub fn empty(slug: impl Into<Arc<str>>) -> Self {
        Self::bind(
            slug,
            Arc::new(BTreeMap::new()),
            Credential::new(),
            Exports::new(),
        )
    }

    /// Whether a method exists.
    pub fn has(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Call a shared method.
    pub fn call(&self, name: &str, args: Value) -> ConnectorFuture<Value> {
        let Some(method) = self.methods.get(name).cloned() else {
            let missing: ConnectorResult<Value> = Err(ConnectorError::new(format!(
                "app '{}' has no method '{}'",
                self.slug, name
            )));
            return Box::pin(async move { missing });
        };
        let ctx = MethodContext {
            args,
            credential: self.credential.clone(),
            exports: self.exports.clone(),
            app: self.clone(),
        };
        method(ctx)
    }
}

impl std::fmt::Debug for AppMethods {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppMethods")
            .field("slug", &self.slug)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Context for a shared app method.
#[derive(Debug, Clone)]
pub struct MethodContext {
    /// Arguments passed by the caller.
    pub args: Value,
    /// Credential of the calling invocation.
    pub credential: Credential,
    /// Export bag of the calling invocation.
    pub exports: Exports,
    /// The app's methods, for methods that call each other.
    pub app: AppMethods,
}

impl MethodContext {
    /// Read a string argument.
    pub fn arg_str(&self, name: &str) -> Option<&str> {
        self.args.get(name).and_then(Value::as_str)
    }
}

/// Context for a component entry point.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Package slug.
    pub slug: String,
    /// Component key.
    pub component_key: String,
    /// Calling user.
    pub user_id: String,
    /// Declared props, with defaults filled in.
    pub props: Map<String, Value>,
    /// Credential for this user and connector.
    pub credential: Credential,
    /// The app's shared methods.
    pub app: AppMethods,
    /// Export bag merged into the result.
    pub exports: Exports,
}

impl RunContext {
    /// Read a prop.
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.props.get(name)
    }

    /// Read a string prop.
    pub fn prop_str(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(Value::as_str)
    }

    /// Deserialize the props into a typed struct.
    pub fn props_as<T: DeserializeOwned>(&self) -> ConnectorResult<T> {
        serde_json::from_value(Value::Object(self.props.clone())).map_err(ConnectorError::from)
    }
}

/// Context for an options resolver.
#[derive(Debug, Clone)]
pub struct OptionsContext {
    /// Package slug.
    pub slug: String,
    /// Component key.
    pub component_key: String,
    /// Prop being resolved.
    pub prop_name: String,
    /// Calling user.
    pub user_id: String,
    /// Props configured so far.
    pub configured_props: Map<String, Value>,
    /// Cursor from the previous page.
    pub prev_context: Option<Value>,
    /// Credential for this user and connector.
    pub credential: Credential,
    /// The app's shared methods.
    pub app: AppMethods,
    /// Export bag (discarded after resolution).
    pub exports: Exports,
}
