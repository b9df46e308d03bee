//! Thin HTTP mapping over the connector registry.
//!
//! Every route translates one HTTP request into one registry call and maps
//! the result back. Errors carry their `D` code; connector failures pass
//! the connector's own message and debug payload through unchanged.
//!
//! # Routes
//!
//! | Method | Path | Registry call |
//! |---|---|---|
//! | GET | `/health` | liveness, metrics |
//! | GET | `/v1/apps?q=&limit=` | `list_apps` |
//! | GET | `/v1/apps/{slug}` | `get_app` |
//! | GET | `/v1/apps/{slug}/actions` | `list_actions_for_app` |
//! | GET | `/v1/apps/{slug}/triggers` | `list_triggers_for_app` |
//! | POST | `/v1/apps/{slug}/register` | `register_package` |
//! | GET | `/v1/components/{key}` | `get_component` |
//! | POST | `/v1/components/props` | `resolve_prop_options` |
//! | POST | `/v1/components/configure` | `get_component` |
//! | POST | `/v1/actions/run` | `invoke_component` |
//!
//! # Example
//!
//! ```ignore
//! use dockyard_runtime::api::{ApiServer, ServerConfig};
//! use dockyard_runtime::registry::ConnectorRegistry;
//!
//! let registry = ConnectorRegistry::builder().build();
//! let mut server = ApiServer::new(ServerConfig::new("127.0.0.1", 8080), registry);
//! server.run().await?;
//! ```

mod error;
pub mod handlers;
mod request;
mod response;
mod router;
mod server;
mod state;

pub use error::ApiError;
pub use server::{ApiServer, ServerConfig, ShutdownHandle};
pub use state::AppState;
