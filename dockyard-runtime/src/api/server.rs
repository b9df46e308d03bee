//! HTTP server setup and connection handling.

use super::router;
use super::state::AppState;
use crate::registry::ConnectorRegistry;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use dockyard_core::error::{DockyardError, Result};

/// Configuration for the API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        let host: std::net::IpAddr = self.host.parse().unwrap_or([0, 0, 0, 0].into());
        SocketAddr::new(host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// HTTP API over a connector registry.
pub struct ApiServer {
    /// Server configuration.
    config: ServerConfig,
    /// Shared application state.
    state: Arc<AppState>,
    /// Shutdown signal sender.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Receiver paired with a handed-out [`ShutdownHandle`].
    shutdown_rx: Option<oneshot::Receiver<()>>,
}

/// Stops an [`ApiServer`] from another task.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl ShutdownHandle {
    /// Signal the server to stop accepting connections.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl ApiServer {
    /// Create a new API server.
    pub fn new(config: ServerConfig, registry: ConnectorRegistry) -> Self {
        let state = Arc::new(AppState::new(registry));

        Self {
            config,
            state,
            shutdown_tx: None,
            shutdown_rx: None,
        }
    }

    /// Get a reference to the application state.
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Handle that stops a running server.
    pub fn shutdown_handle(&mut self) -> ShutdownHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);
        self.shutdown_rx = Some(shutdown_rx);
        ShutdownHandle {
            tx: self.shutdown_tx.take(),
        }
    }

    /// Bind the listening socket.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.socket_addr();
        TcpListener::bind(addr).await.map_err(|e| DockyardError::Io {
            path: std::path::PathBuf::from(format!("{}:{}", self.config.host, self.config.port)),
            cause: e.to_string(),
        })
    }

    /// Run the server until shutdown signal is received.
    pub async fn run(&mut self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    pub async fn serve(&mut self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = match self.shutdown_rx.take() {
            Some(rx) => rx,
            None => {
                let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
                self.shutdown_tx = Some(shutdown_tx);
                shutdown_rx
            }
        };

        match listener.local_addr() {
            Ok(addr) => tracing::info!(addr = %addr, "API server started"),
            Err(_) => tracing::info!(
                host = %self.config.host,
                port = %self.config.port,
                "API server started"
            ),
        }

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, remote_addr) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let io = TokioIo::new(stream);
                    let state = Arc::clone(&self.state);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { router::route(req, state).await }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            if !e.is_incomplete_message() {
                                tracing::warn!(
                                    remote = %remote_addr,
                                    error = %e,
                                    "HTTP connection error"
                                );
                            }
                        }
                    });
                }
                _ = &mut shutdown_rx => {
                    tracing::info!("API server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
