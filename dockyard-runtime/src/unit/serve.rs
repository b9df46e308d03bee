//! The execution unit's boot sequence and serve loop.

use super::context::{ExecutionContextBuilder, merge_result};
use super::index::UnitIndex;
use super::launcher::UnitSpec;
use super::loader::load_package;
use crate::normalize::governing_prop;
use crate::{instrument_invocation, instrument_unit};
use dockyard_core::connector::ConnectorError;
use dockyard_core::error::{DockyardError, Result};
use dockyard_core::metadata::OptionsPage;
use dockyard_core::protocol::{
    self, HostMessage, Operation, PropOptionsArgs, Request, Response, RunArgs, UnitMessage,
};
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::Instrument;

/// Run one execution unit to completion.
///
/// Boots the package, announces `ready`, then serves requests concurrently
/// until the host asks it to stop, closes the channel, or a request faults.
/// An unhandled fault (including a panic in connector code) is reported as
/// a `fatal` event and ends the unit.
pub async fn run_unit(
    spec: UnitSpec,
    mut inbound: UnboundedReceiver<String>,
    outbound: UnboundedSender<String>,
) {
    let span = instrument_unit!(spec.slug, spec.generation);
    async move {
        let booted = std::panic::catch_unwind(AssertUnwindSafe(|| {
            load_package(&spec.slug, &spec.package_dir, &spec.catalog)
        }));
        let index = match booted {
            Ok(Ok(index)) => Arc::new(index),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Execution unit failed to boot");
                send_fatal(&outbound, e.to_string());
                return;
            }
            Err(panic) => {
                let cause = format!("panic during boot: {}", panic_message(panic.as_ref()));
                tracing::error!(error = %cause, "Execution unit failed to boot");
                send_fatal(&outbound, cause);
                return;
            }
        };

        tracing::info!(
            components = index.manifest().components.len(),
            "Execution unit ready"
        );
        send(&outbound, &UnitMessage::Ready(index.manifest().clone()));

        let (fault_tx, mut fault_rx) = mpsc::unbounded_channel::<String>();

        loop {
            tokio::select! {
                frame = inbound.recv() => {
                    let Some(frame) = frame else {
                        tracing::debug!("Host closed the channel");
                        break;
                    };
                    match protocol::decode::<HostMessage>(&frame) {
                        Ok(HostMessage::Request(request)) => {
                            spawn_request(Arc::clone(&index), request, outbound.clone(), fault_tx.clone());
                        }
                        Ok(HostMessage::Shutdown) => {
                            tracing::info!("Execution unit shutting down");
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Ignoring malformed frame from host");
                        }
                    }
                }
                Some(cause) = fault_rx.recv() => {
                    tracing::error!(error = %cause, "Unhandled fault in execution unit");
                    send_fatal(&outbound, cause);
                    break;
                }
            }
        }
    }
    .instrument(span)
    .await
}

fn spawn_request(
    index: Arc<UnitIndex>,
    request: Request,
    outbound: UnboundedSender<String>,
    fault_tx: UnboundedSender<String>,
) {
    let operation = request.operation.name();
    let span = instrument_invocation!(request.id, operation);
    tokio::spawn(
        async move {
            match AssertUnwindSafe(handle(index, request)).catch_unwind().await {
                Ok(response) => send(&outbound, &UnitMessage::Response(response)),
                Err(panic) => {
                    let _ = fault_tx.send(format!(
                        "panic while serving {}: {}",
                        operation,
                        panic_message(panic.as_ref())
                    ));
                }
            }
        }
        .instrument(span),
    );
}

/// Serve one request.
pub async fn handle(index: Arc<UnitIndex>, request: Request) -> Response {
    let id = request.id;
    let outcome = match request.operation {
        Operation::ListComponents => {
            serde_json::to_value(index.component_index()).map_err(DockyardError::from)
        }
        Operation::PropOptions(args) => prop_options(&index, args).await,
        Operation::RunComponent(args) => run_component(&index, args).await,
    };
    if let Err(e) = &outcome {
        tracing::debug!(error = %e, "Request failed");
    }
    Response { id, outcome }
}

async fn prop_options(index: &UnitIndex, args: PropOptionsArgs) -> Result<Value> {
    let component = index
        .component(&args.component_key)
        .ok_or_else(|| DockyardError::ComponentNotFound {
            key: args.component_key.clone(),
        })?;

    let resolver_name = governing_prop(index.app(), component, &args.prop_name)
        .and_then(|raw| raw.options_resolver.clone())
        .filter(|name| !name.is_empty());
    let Some(resolver_name) = resolver_name else {
        return Ok(serde_json::to_value(OptionsPage::empty())?);
    };

    let Some(resolver) = index.module().and_then(|m| m.resolver(&resolver_name)) else {
        tracing::warn!(
            key = %component.key,
            prop = %args.prop_name,
            resolver = %resolver_name,
            "Options resolver is not compiled into the connector"
        );
        return Ok(serde_json::to_value(OptionsPage::empty())?);
    };

    let builder = ExecutionContextBuilder::new(index, args.user_id, args.credential);
    let ctx = builder.options_context(
        component,
        &args.prop_name,
        args.configured_props,
        args.prev_context,
    );
    let value = resolver(ctx)
        .await
        .map_err(|e| invocation_failed(&component.key, e, &builder))?;
    let page = OptionsPage::from_resolver_value(value).unwrap_or_else(|| {
        tracing::warn!(
            key = %component.key,
            prop = %args.prop_name,
            resolver = %resolver_name,
            "Options resolver returned neither a list nor an object with options; discarding"
        );
        OptionsPage::empty()
    });
    Ok(serde_json::to_value(page)?)
}

async fn run_component(index: &UnitIndex, args: RunArgs) -> Result<Value> {
    let component = index
        .component(&args.component_key)
        .ok_or_else(|| DockyardError::ComponentNotFound {
            key: args.component_key.clone(),
        })?;

    let entry = index
        .module()
        .and_then(|m| m.entry_point(component.entry_point()))
        .ok_or_else(|| DockyardError::MissingEntryPoint {
            key: component.key.clone(),
        })?;

    let builder = ExecutionContextBuilder::new(index, args.user_id, args.credential);
    let ctx = builder.run_context(component, &args.props);
    let value = entry(ctx)
        .await
        .map_err(|e| invocation_failed(&component.key, e, &builder))?;
    Ok(merge_result(value, builder.exports().snapshot()))
}

fn invocation_failed(key: &str, error: ConnectorError, builder: &ExecutionContextBuilder<'_>) -> DockyardError {
    DockyardError::InvocationFailed {
        key: key.to_string(),
        message: error.message,
        debug: error.debug,
        exports: builder.exports().snapshot(),
    }
}

fn send(outbound: &UnboundedSender<String>, message: &UnitMessage) {
    match protocol::encode(message) {
        Ok(frame) => {
            if outbound.send(frame).is_err() {
                tracing::debug!("Host is gone; dropping frame");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to encode frame"),
    }
}

fn send_fatal(outbound: &UnboundedSender<String>, error: String) {
    send(outbound, &UnitMessage::Fatal { error });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockyard_core::connector::{ConnectorModule, OptionsContext, RunContext};
    use dockyard_core::credential::Credential;
    use dockyard_core::definition::{AppDefinition, ComponentDefinition, PackageManifest};
    use dockyard_core::metadata::UnitManifest;
    use serde_json::{Map, json};

    fn index() -> Arc<UnitIndex> {
        let app: AppDefinition = serde_yaml::from_str(
            "prop_definitions:\n  units:\n    options_resolver: list_units\n  orphan:\n    options_resolver: not_compiled\n  odd:\n    options_resolver: odd_shape\n",
        )
        .unwrap();
        let forecast: ComponentDefinition = serde_yaml::from_str(
            "key: get_forecast\nprops:\n  city:\n    default: NYC\n  units:\n    prop_definition: true\n  orphan:\n    prop_definition: true\n  odd:\n    prop_definition: true\n  plain: {}\n",
        )
        .unwrap();
        let unbound: ComponentDefinition = serde_yaml::from_str("key: unbound\n").unwrap();
        let failing: ComponentDefinition = serde_yaml::from_str("key: failing\n").unwrap();

        let module = ConnectorModule::builder("weather")
            .entry_point("get_forecast", |ctx: RunContext| async move {
                let city = ctx.prop_str("city").unwrap_or_default().to_string();
                ctx.exports.export("summary", format!("Forecast for {}", city));
                ctx.exports.summary(format!("Forecast for {}", city));
                Ok(json!({"city": city, "temp": 21}))
            })
            .entry_point("failing", |ctx: RunContext| async move {
                ctx.exports.export("attempted", true);
                Err(ConnectorError::new("upstream down").with_debug(json!({"status": 503})))
            })
            .options_resolver("list_units", |ctx: OptionsContext| async move {
                let page = ctx.prev_context.and_then(|c| c.as_u64()).unwrap_or(0);
                Ok(json!({"options": ["metric", {"label": "Imperial", "value": "imperial"}], "context": page + 1}))
            })
            .options_resolver("odd_shape", |_ctx: OptionsContext| async move { Ok(json!("red")) })
            .build();

        Arc::new(UnitIndex::new(
            UnitManifest {
                slug: "weather".to_string(),
                manifest: PackageManifest::default(),
                app: Some(app),
                components: vec![forecast, unbound, failing],
            },
            Some(Arc::new(module)),
        ))
    }

    fn run(key: &str, props: Value) -> Request {
        Request::new(Operation::RunComponent(RunArgs {
            component_key: key.to_string(),
            props: props.as_object().cloned().unwrap_or_default(),
            user_id: "u1".to_string(),
            credential: Credential::new(),
        }))
    }

    fn options(key: &str, prop: &str) -> Request {
        Request::new(Operation::PropOptions(PropOptionsArgs {
            component_key: key.to_string(),
            prop_name: prop.to_string(),
            user_id: "u1".to_string(),
            configured_props: Map::new(),
            prev_context: Some(json!(4)),
            credential: Credential::new(),
        }))
    }

    #[tokio::test]
    async fn run_applies_defaults_and_merges_exports() {
        let request = run("get_forecast", json!({}));
        let id = request.id;
        let response = handle(index(), request).await;
        assert_eq!(response.id, id);

        let value = response.outcome.unwrap();
        assert_eq!(value["city"], "NYC");
        assert_eq!(value["summary"], "Forecast for NYC");
        assert_eq!(value["$summary"], "Forecast for NYC");
    }

    #[tokio::test]
    async fn run_errors() {
        let err = handle(index(), run("nope", json!({}))).await.outcome.unwrap_err();
        assert!(err.is_not_found());

        let err = handle(index(), run("unbound", json!({}))).await.outcome.unwrap_err();
        assert_eq!(err.code(), "D302");

        match handle(index(), run("failing", json!({}))).await.outcome {
            Err(DockyardError::InvocationFailed {
                message,
                debug,
                exports,
                ..
            }) => {
                assert_eq!(message, "upstream down");
                assert_eq!(debug, Some(json!({"status": 503})));
                assert_eq!(exports.get("attempted"), Some(&json!(true)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn dynamic_options_are_resolved() {
        let value = handle(index(), options("get_forecast", "units"))
            .await
            .outcome
            .unwrap();
        let page: OptionsPage = serde_json::from_value(value).unwrap();
        assert_eq!(page.options.len(), 2);
        assert_eq!(page.options[0].label, "metric");
        assert_eq!(page.options[1].value, json!("imperial"));
        assert_eq!(page.context, Some(json!(5)));
    }

    #[tokio::test]
    async fn static_missing_uncompiled_and_malformed_resolvers_yield_empty_lists() {
        for prop in ["plain", "city", "does_not_exist", "orphan", "odd"] {
            let value = handle(index(), options("get_forecast", prop))
                .await
                .outcome
                .unwrap();
            let page: OptionsPage = serde_json::from_value(value).unwrap();
            assert!(page.options.is_empty(), "prop {}", prop);
        }

        let err = handle(index(), options("ghost", "units")).await.outcome.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn plain_declaration_defers_to_app_definition_of_same_name() {
        let app: AppDefinition =
            serde_yaml::from_str("prop_definitions:\n  q:\n    options_resolver: list_q\n").unwrap();
        let search: ComponentDefinition =
            serde_yaml::from_str("key: search\nprops:\n  q:\n    type: string\n").unwrap();
        let module = ConnectorModule::builder("search")
            .options_resolver("list_q", |_ctx: OptionsContext| async move {
                Ok(json!({"options": ["rust", "tokio"]}))
            })
            .build();
        let index = Arc::new(UnitIndex::new(
            UnitManifest {
                slug: "search".to_string(),
                manifest: PackageManifest::default(),
                app: Some(app),
                components: vec![search],
            },
            Some(Arc::new(module)),
        ));

        let value = handle(index, options("search", "q")).await.outcome.unwrap();
        let page: OptionsPage = serde_json::from_value(value).unwrap();
        assert_eq!(page.options.len(), 2);
        assert_eq!(page.options[1].label, "tokio");
    }

    #[tokio::test]
    async fn list_components_returns_index() {
        let value = handle(index(), Request::new(Operation::ListComponents))
            .await
            .outcome
            .unwrap();
        assert_eq!(
            value,
            json!({"actions": ["get_forecast", "unbound", "failing"], "triggers": []})
        );
    }

    #[test]
    fn panic_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
