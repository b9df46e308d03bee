//! Compiled connector modules.

use super::context::{MethodContext, OptionsContext, RunContext};
use super::error::ConnectorResult;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by connector code.
pub type ConnectorFuture<T> = Pin<Box<dyn Future<Output = ConnectorResult<T>> + Send + 'static>>;

/// A shared app method.
pub type MethodFn = Arc<dyn Fn(MethodContext) -> ConnectorFuture<Value> + Send + Sync>;

/// A component entry point.
pub type RunFn = Arc<dyn Fn(RunContext) -> ConnectorFuture<Value> + Send + Sync>;

/// A dynamic options resolver. Returns a list of options or
/// `{options, context}`.
pub type ResolverFn = Arc<dyn Fn(OptionsContext) -> ConnectorFuture<Value> + Send + Sync>;

/// Hook run once while the unit boots.
pub type BootFn = Arc<dyn Fn() -> ConnectorResult<()> + Send + Sync>;

/// The executable half of a connector package.
///
/// Definitions on disk name entry points and resolvers; the unit binds those
/// names to the closures registered here.
///
/// # Example
///
/// ```ignore
/// let module = ConnectorModule::builder("weather")
///     .method("fetch", |ctx| async move { Ok(ctx.args) })
///     .entry_point("get_forecast", |ctx| async move {
///         ctx.exports.summary("Fetched forecast");
///         ctx.app.call("fetch", ctx.prop("city").cloned().unwrap_or_default()).await
///     })
///     .build();
/// ```
pub struct ConnectorModule {
    slug: String,
    boot: Option<BootFn>,
    methods: Arc<BTreeMap<String, MethodFn>>,
    entry_points: HashMap<String, RunFn>,
    resolvers: HashMap<String, ResolverFn>,
}

impl ConnectorModule {
    /// Start building a module for a package slug.
    pub fn builder(slug: impl Into<String>) -> ConnectorModuleBuilder {
        ConnectorModuleBuilder {
            slug: slug.into(),
            boot: None,
            methods: BTreeMap::new(),
            entry_points: HashMap::new(),
            resolvers: HashMap::new(),
        }
    }

    /// Package slug.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Boot hook, if any.
    pub fn boot_hook(&self) -> Option<&BootFn> {
        self.boot.as_ref()
    }

    /// Shared method table.
    pub fn methods(&self) -> Arc<BTreeMap<String, MethodFn>> {
        Arc::clone(&self.methods)
    }

    /// Look up an entry point.
    pub fn entry_point(&self, name: &str) -> Option<RunFn> {
        self.entry_points.get(name).cloned()
    }

    /// Look up an options resolver.
    pub fn resolver(&self, name: &str) -> Option<ResolverFn> {
        self.resolvers.get(name).cloned()
    }

    /// Names of all entry points.
    pub fn entry_point_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entry_points.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ConnectorModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorModule")
            .field("slug", &self.slug)
            .field("boot", &self.boot.is_some())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("entry_points", &self.entry_point_names())
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`ConnectorModule`].
pub struct ConnectorModuleBuilder {
    slug: String,
    boot: Option<BootFn>,
    methods: BTreeMap<String, MethodFn>,
    entry_points: HashMap<String, RunFn>,
    resolvers: HashMap<String, ResolverFn>,
}

impl ConnectorModuleBuilder {
    /// Set the boot hook.
    pub fn on_boot<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> ConnectorResult<()> + Send + Sync + 'static,
    {
        self.boot = Some(Arc::new(hook));
        self
    }

    /// Register a shared app method.
    pub fn method<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(MethodContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ConnectorResult<Value>> + Send + 'static,
    {
        let method: MethodFn =
            Arc::new(move |ctx: MethodContext| -> ConnectorFuture<Value> { Box::pin(f(ctx)) });
        self.methods.insert(name.into(), method);
        self
    }

    /// Register a component entry point.
    pub fn entry_point<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(RunContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ConnectorResult<Value>> + Send + 'static,
    {
        let entry: RunFn =
            Arc::new(move |ctx: RunContext| -> ConnectorFuture<Value> { Box::pin(f(ctx)) });
        self.entry_points.insert(name.into(), entry);
        self
    }

    /// Register an options resolver.
    pub fn options_resolver<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(OptionsContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ConnectorResult<Value>> + Send + 'static,
    {
        let resolver: ResolverFn =
            Arc::new(move |ctx: OptionsContext| -> ConnectorFuture<Value> { Box::pin(f(ctx)) });
        self.resolvers.insert(name.into(), resolver);
        self
    }

    /// Finish the module.
    pub fn build(self) -> ConnectorModule {
        ConnectorModule {
            slug: self.slug,
            boot: self.boot,
            methods: Arc::new(self.methods),
            entry_points: self.entry_points,
            resolvers: self.resolvers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{AppMethods, ConnectorError, Exports};
    use crate::credential::Credential;
    use serde_json::{Map, json};

    fn module() -> ConnectorModule {
        ConnectorModule::builder("test")
            .on_boot(|| Ok(()))
            .method("whoami", |ctx: MethodContext| async move {
                let key = ctx.credential.get_str("api_key").unwrap_or("anonymous");
                ctx.exports.export("called", true);
                Ok(Value::from(key))
            })
            .method("twice", |ctx: MethodContext| async move {
                let who = ctx.app.call("whoami", Value::Null).await?;
                Ok(json!([who, who]))
            })
            .entry_point("echo", |ctx: RunContext| async move {
                Ok(Value::Object(ctx.props))
            })
            .entry_point("fail", |_ctx: RunContext| async move {
                Err(ConnectorError::new("nope").with_debug(json!({"status": 500})))
            })
            .build()
    }

    #[test]
    fn lookups() {
        let module = module();
        assert_eq!(module.slug(), "test");
        assert!(module.boot_hook().is_some());
        assert!(module.entry_point("echo").is_some());
        assert!(module.entry_point("missing").is_none());
        assert!(module.resolver("anything").is_none());
        assert_eq!(module.entry_point_names(), vec!["echo", "fail"]);
    }

    #[tokio::test]
    async fn methods_see_the_bound_credential_and_exports() {
        let exports = Exports::new();
        let app = AppMethods::bind(
            "test",
            module().methods(),
            Credential::new().with("api_key", "k-1"),
            exports.clone(),
        );

        assert_eq!(app.call("whoami", Value::Null).await.unwrap(), json!("k-1"));
        assert_eq!(exports.get("called"), Some(json!(true)));
        assert_eq!(
            app.call("twice", Value::Null).await.unwrap(),
            json!(["k-1", "k-1"])
        );
    }

    #[tokio::test]
    async fn entry_points_run() {
        let module = module();
        let mut props = Map::new();
        props.insert("a".to_string(), json!(1));
        let ctx = RunContext {
            slug: "test".to_string(),
            component_key: "echo".to_string(),
            user_id: "u".to_string(),
            props,
            credential: Credential::new(),
            app: AppMethods::bind("test", module.methods(), Credential::new(), Exports::new()),
            exports: Exports::new(),
        };

        let echo = module.entry_point("echo").unwrap();
        assert_eq!(echo(ctx.clone()).await.unwrap(), json!({"a": 1}));

        let fail = module.entry_point("fail").unwrap();
        let err = fail(ctx).await.unwrap_err();
        assert_eq!(err.message, "nope");
        assert_eq!(err.debug, Some(json!({"status": 500})));
    }
}
