//! Serve command - load the package store and run the HTTP API.

use super::HostOptions;
use anyhow::Result;
use dockyard_runtime::api::{ApiServer, ServerConfig};

/// Run the serve command.
pub async fn run(options: &HostOptions, host: &str, port: u16) -> Result<()> {
    let registry = options.loaded_registry().await?;
    tracing::info!(
        host = %host,
        port = %port,
        packages = %registry.config().packages_dir.display(),
        "Starting Dockyard API server"
    );

    let mut server = ApiServer::new(ServerConfig::new(host, port), registry.clone());
    let listener = server.bind().await?;
    let handle = server.shutdown_handle();

    println!("Dockyard connector host");
    println!();
    println!("Server:   http://{}:{}", host, port);
    println!("Apps:     {}", registry.live_slugs().join(", "));
    println!();
    println!("Endpoints:");
    println!("  GET  /health                  - Health check");
    println!("  GET  /v1/apps                 - List apps (?q=&limit=)");
    println!("  GET  /v1/apps/{{slug}}/actions  - Actions of an app");
    println!("  POST /v1/components/props     - Resolve prop options");
    println!("  POST /v1/actions/run          - Run an action");
    println!();
    println!("Press Ctrl+C to stop.");

    let server_task = tokio::spawn(async move { server.serve(listener).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    println!();
    println!("Shutting down...");

    handle.shutdown();
    registry.shutdown();
    server_task.await??;
    Ok(())
}
