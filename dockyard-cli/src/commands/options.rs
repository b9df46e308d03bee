//! Options command - resolve the options of a component prop.

use super::{HostOptions, parse_object, print_json};
use anyhow::{Context, Result};
use serde_json::Value;

/// Run the options command.
pub async fn run(
    options: &HostOptions,
    key: &str,
    prop: &str,
    user: &str,
    props: &str,
    context: Option<&str>,
) -> Result<()> {
    let configured = parse_object("props", props)?;
    let prev_context = context
        .map(|raw| serde_json::from_str::<Value>(raw).context("--context is not valid JSON"))
        .transpose()?;

    let registry = options.loaded_registry().await?;
    let result = registry
        .resolve_prop_options(user, key, prop, configured, prev_context)
        .await;
    registry.shutdown();

    print_json(&result?)
}
