//! Apps command - list the apps in the package store.

use super::HostOptions;
use anyhow::Result;

/// Run the apps command.
pub async fn run(options: &HostOptions, query: Option<&str>) -> Result<()> {
    let registry = options.loaded_registry().await?;
    let needle = query.map(|q| q.trim().to_lowercase());

    let apps: Vec<_> = registry
        .list_apps()
        .await
        .into_iter()
        .filter(|app| match &needle {
            Some(needle) => app.name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .collect();

    println!("{:<20} {:<24} {:<10} {:<8} CATEGORIES", "SLUG", "NAME", "VERSION", "AUTH");
    println!("{:<20} {:<24} {:<10} {:<8} ----------", "----", "----", "-------", "----");
    for app in &apps {
        println!(
            "{:<20} {:<24} {:<10} {:<8} {}",
            app.name_slug,
            app.name,
            app.version.as_deref().unwrap_or("-"),
            app.auth_type,
            app.categories.join(", ")
        );
    }
    println!();
    println!("{} app(s)", apps.len());

    registry.shutdown();
    Ok(())
}
