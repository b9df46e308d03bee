//! Components command - show the actions and triggers of one app.

use super::HostOptions;
use anyhow::Result;
use dockyard_core::metadata::ComponentMetadata;
use dockyard_runtime::registry::ConnectorRegistry;

/// Run the components command.
pub async fn run(options: &HostOptions, slug: &str) -> Result<()> {
    let registry = options.loaded_registry().await?;
    let result = show(&registry, slug).await;
    registry.shutdown();
    result
}

async fn show(registry: &ConnectorRegistry, slug: &str) -> Result<()> {
    let app = registry.get_app(slug).await?;
    let actions = registry.list_actions_for_app(slug).await?;
    let triggers = registry.list_triggers_for_app(slug).await?;

    println!("{} ({})", app.name, app.name_slug);
    if !app.description.is_empty() {
        println!("{}", app.description);
    }
    println!();
    print_section("Actions", &actions);
    print_section("Triggers", &triggers);
    Ok(())
}

fn print_section(title: &str, components: &[ComponentMetadata]) {
    println!("{}:", title);
    if components.is_empty() {
        println!("  (none)");
    }
    for component in components {
        println!("  {} v{} - {}", component.key, component.version, component.name);
        for prop in &component.configurable_props {
            let mut flags = Vec::new();
            if prop.optional {
                flags.push("optional".to_string());
            }
            if prop.remote_options {
                flags.push("dynamic options".to_string());
            }
            if let Some(default) = &prop.default {
                flags.push(format!("default {}", default));
            }
            if flags.is_empty() {
                println!("      {}: {}", prop.name, prop.prop_type);
            } else {
                println!("      {}: {} ({})", prop.name, prop.prop_type, flags.join(", "));
            }
        }
    }
    println!();
}
