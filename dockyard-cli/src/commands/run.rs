//! Run command - invoke an action and print its output.

use super::{HostOptions, parse_object, print_json};
use anyhow::Result;

/// Run the run command.
pub async fn run(options: &HostOptions, key: &str, user: &str, props: &str) -> Result<()> {
    let input = parse_object("props", props)?;
    let registry = options.loaded_registry().await?;

    tracing::info!(key = %key, user = %user, "Running component");
    let result = registry.invoke_component(user, key, input).await;
    registry.shutdown();

    print_json(&result?)
}
