//! Launching execution units.

use super::serve::run_unit;
use dockyard_core::connector::ConnectorCatalog;
use dockyard_core::error::{DockyardError, Result};
use dockyard_core::protocol::{self, UnitMessage};
use dockyard_core::types::Generation;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// What a unit needs to boot.
#[derive(Clone)]
pub struct UnitSpec {
    /// Package slug.
    pub slug: String,
    /// Registration generation the unit serves under.
    pub generation: Generation,
    /// Package directory.
    pub package_dir: PathBuf,
    /// Compiled connector code.
    pub catalog: Arc<ConnectorCatalog>,
}

impl std::fmt::Debug for UnitSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitSpec")
            .field("slug", &self.slug)
            .field("generation", &self.generation)
            .field("package_dir", &self.package_dir)
            .finish_non_exhaustive()
    }
}

/// The host's end of a unit's message channel.
///
/// The unit has exited once `inbound` yields `None`.
#[derive(Debug)]
pub struct UnitChannel {
    /// Frames to the unit.
    pub outbound: UnboundedSender<String>,
    /// Frames from the unit.
    pub inbound: UnboundedReceiver<String>,
}

/// Starts execution units.
pub trait UnitLauncher: Send + Sync {
    /// Start a unit for `spec` and return the host's end of its channel.
    fn launch(&self, spec: UnitSpec) -> Result<UnitChannel>;

    /// Launcher name for logs.
    fn name(&self) -> &'static str;
}

/// Runs each unit on a dedicated OS thread with its own single-threaded
/// tokio runtime. A unit that blocks, panics or exits does not take other
/// units or the host's runtime with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLauncher;

impl ThreadLauncher {
    /// Create a launcher.
    pub fn new() -> Self {
        Self
    }
}

impl UnitLauncher for ThreadLauncher {
    fn launch(&self, spec: UnitSpec) -> Result<UnitChannel> {
        let (host_tx, unit_rx) = mpsc::unbounded_channel();
        let (unit_tx, host_rx) = mpsc::unbounded_channel();
        let slug = spec.slug.clone();

        std::thread::Builder::new()
            .name(format!("unit-{}", spec.slug))
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let fatal = UnitMessage::Fatal {
                            error: format!("failed to start unit runtime: {}", e),
                        };
                        if let Ok(frame) = protocol::encode(&fatal) {
                            let _ = unit_tx.send(frame);
                        }
                        return;
                    }
                };
                runtime.block_on(run_unit(spec, unit_rx, unit_tx));
            })
            .map_err(|e| DockyardError::UnitLaunch {
                slug: slug.clone(),
                cause: e.to_string(),
            })?;

        tracing::debug!(slug = %slug, "Execution unit thread started");
        Ok(UnitChannel {
            outbound: host_tx,
            inbound: host_rx,
        })
    }

    fn name(&self) -> &'static str {
        "thread"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockyard_core::protocol::{HostMessage, Operation, Request, Response};
    use std::time::Duration;

    fn spec(dir: PathBuf) -> UnitSpec {
        UnitSpec {
            slug: "empty".to_string(),
            generation: Generation::new(1),
            package_dir: dir,
            catalog: Arc::new(ConnectorCatalog::new()),
        }
    }

    async fn next(channel: &mut UnitChannel) -> Option<UnitMessage> {
        let frame = tokio::time::timeout(Duration::from_secs(5), channel.inbound.recv())
            .await
            .ok()??;
        protocol::decode(&frame).ok()
    }

    #[tokio::test]
    async fn boots_serves_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("actions")).unwrap();
        std::fs::write(dir.path().join("actions/a.yaml"), "key: a\n").unwrap();

        let mut channel = ThreadLauncher::new().launch(spec(dir.path().to_path_buf())).unwrap();
        match next(&mut channel).await {
            Some(UnitMessage::Ready(manifest)) => assert_eq!(manifest.components.len(), 1),
            other => panic!("expected ready, got {:?}", other),
        }

        let request = Request::new(Operation::ListComponents);
        let id = request.id;
        channel
            .outbound
            .send(protocol::encode(&HostMessage::Request(request)).unwrap())
            .unwrap();
        match next(&mut channel).await {
            Some(UnitMessage::Response(Response { id: got, outcome })) => {
                assert_eq!(got, id);
                assert!(outcome.is_ok());
            }
            other => panic!("expected response, got {:?}", other),
        }

        channel
            .outbound
            .send(protocol::encode(&HostMessage::Shutdown).unwrap())
            .unwrap();
        assert!(next(&mut channel).await.is_none());
    }

    #[tokio::test]
    async fn boot_failure_is_reported_as_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut channel = ThreadLauncher::new()
            .launch(spec(dir.path().join("missing")))
            .unwrap();
        match next(&mut channel).await {
            Some(UnitMessage::Fatal { error }) => assert!(error.contains("D104")),
            other => panic!("expected fatal, got {:?}", other),
        }
        assert!(next(&mut channel).await.is_none());
    }
}
