//! Version command - show version information.

use anyhow::Result;

/// Version information.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the version command.
pub fn run() -> Result<()> {
    println!("Dockyard - Connector Host Runtime");
    println!();
    println!("Version:     {}", VERSION);
    println!(
        "Platform:    {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!();
    println!("Components:");
    println!("  dockyard-core        Errors, definitions, metadata, wire protocol");
    println!("  dockyard-runtime     Execution units, registry, HTTP API");
    println!("  dockyard-connectors  Built-in connectors");
    println!("  dockyard-cli         Command-line interface");
    println!();
    println!("Built-in connectors: {}", dockyard_connectors::standard_catalog().slugs().join(", "));

    Ok(())
}
