//! Dockyard CLI - run and query the connector host.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dockyard_runtime::observability::{TracingConfig, TracingGuard, init_tracing};
use std::path::PathBuf;

/// Dockyard - host connector packages in isolated execution units.
#[derive(Parser)]
#[command(name = "dockyard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Package store root (overrides config file and environment)
    #[arg(long, global = true)]
    packages: Option<PathBuf>,

    /// Host configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every package and serve the HTTP API
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// List the apps in the package store
    Apps {
        /// Case-insensitive name filter
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show the actions and triggers of one app
    Components {
        /// App slug
        slug: String,
    },

    /// Resolve the options of a component prop
    Options {
        /// Component key
        key: String,

        /// Prop name
        prop: String,

        /// Calling user
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Props configured so far (JSON object)
        #[arg(long, default_value = "{}")]
        props: String,

        /// Cursor returned by the previous page (JSON)
        #[arg(long)]
        context: Option<String>,
    },

    /// Run an action and print its output
    Run {
        /// Component key
        key: String,

        /// Calling user
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Input props (JSON object)
        #[arg(long, default_value = "{}")]
        props: String,
    },

    /// Show version information
    Version,
}

fn setup_logging(verbosity: u8) -> Result<TracingGuard> {
    init_tracing(TracingConfig::for_verbosity(verbosity))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _tracing_guard = setup_logging(cli.verbose)?;
    let host = commands::HostOptions {
        packages: cli.packages,
        config: cli.config,
    };

    match cli.command {
        Commands::Serve { host: bind, port } => commands::serve::run(&host, &bind, port).await,
        Commands::Apps { query } => commands::apps::run(&host, query.as_deref()).await,
        Commands::Components { slug } => commands::components::run(&host, &slug).await,
        Commands::Options {
            key,
            prop,
            user,
            props,
            context,
        } => {
            commands::options::run(&host, &key, &prop, &user, &props, context.as_deref()).await
        }
        Commands::Run { key, user, props } => {
            commands::run::run(&host, &key, &user, &props).await
        }
        Commands::Version => commands::version::run(),
    }
}
