//! Reads a unit's frames and routes them.

use super::pending::PendingTable;
use dockyard_core::metadata::UnitManifest;
use dockyard_core::protocol::{self, UnitMessage};
use dockyard_core::types::Generation;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Cause recorded when a unit exits without reporting a fatal error.
pub const EXIT_CAUSE: &str = "execution unit exited";

/// Outcome of a unit's boot as seen by the host.
pub type BootSignal = std::result::Result<UnitManifest, String>;

/// Spawn the task that drains a unit's inbound frames.
///
/// The first `ready` event settles `boot`. A `fatal` event before that
/// settles it with the error. Responses are routed to the pending table.
/// When the channel closes every outstanding request is rejected and
/// `on_exit` runs once with the exit cause.
pub fn spawn_reader<F>(
    slug: String,
    generation: Generation,
    mut inbound: UnboundedReceiver<String>,
    pending: Arc<PendingTable>,
    boot: oneshot::Sender<BootSignal>,
    on_exit: F,
) -> JoinHandle<()>
where
    F: FnOnce(String) + Send + 'static,
{
    tokio::spawn(async move {
        let mut boot = Some(boot);
        let mut fatal: Option<String> = None;

        while let Some(frame) = inbound.recv().await {
            let message = match protocol::decode::<UnitMessage>(&frame) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(slug = %slug, error = %e, "Ignoring malformed frame from unit");
                    continue;
                }
            };

            match message {
                UnitMessage::Ready(manifest) => match boot.take() {
                    Some(tx) => {
                        let _ = tx.send(Ok(manifest));
                    }
                    None => {
                        tracing::warn!(slug = %slug, generation = %generation, "Duplicate ready event ignored");
                    }
                },
                UnitMessage::Fatal { error } => {
                    tracing::error!(slug = %slug, generation = %generation, error = %error, "Execution unit reported a fatal error");
                    if let Some(tx) = boot.take() {
                        let _ = tx.send(Err(error.clone()));
                    }
                    pending.close_and_reject_all(&error);
                    fatal = Some(error);
                }
                UnitMessage::Response(response) => {
                    let id = response.id;
                    if !pending.resolve(id, response.outcome) {
                        tracing::debug!(slug = %slug, request_id = %id, "Discarding response with no waiting request");
                    }
                }
            }
        }

        let cause = fatal.unwrap_or_else(|| EXIT_CAUSE.to_string());
        let rejected = pending.close_and_reject_all(&cause);
        if let Some(tx) = boot.take() {
            let _ = tx.send(Err(cause.clone()));
        }
        tracing::info!(
            slug = %slug,
            generation = %generation,
            rejected,
            cause = %cause,
            "Execution unit exited"
        );
        on_exit(cause);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockyard_core::definition::PackageManifest;
    use dockyard_core::protocol::Response;
    use dockyard_core::types::RequestId;
    use serde_json::json;
    use tokio::sync::mpsc;

    fn manifest() -> UnitManifest {
        UnitManifest {
            slug: "weather".to_string(),
            manifest: PackageManifest::default(),
            app: None,
            components: Vec::new(),
        }
    }

    fn frame(message: &UnitMessage) -> String {
        protocol::encode(message).unwrap()
    }

    #[tokio::test]
    async fn ready_then_responses_then_exit() {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingTable::new("weather"));
        let (boot_tx, boot_rx) = oneshot::channel();
        let (exit_tx, exit_rx) = oneshot::channel();

        let handle = spawn_reader(
            "weather".to_string(),
            Generation::new(1),
            rx,
            Arc::clone(&pending),
            boot_tx,
            move |cause| {
                let _ = exit_tx.send(cause);
            },
        );

        tx.send(frame(&UnitMessage::Ready(manifest()))).unwrap();
        assert_eq!(boot_rx.await.unwrap().unwrap().slug, "weather");

        let id = RequestId::new();
        let (resp_tx, resp_rx) = oneshot::channel();
        pending.insert(id, resp_tx).unwrap();
        tx.send(frame(&UnitMessage::Response(Response::ok(id, json!(7)))))
            .unwrap();
        assert_eq!(resp_rx.await.unwrap().unwrap(), json!(7));

        let (orphan_tx, orphan_rx) = oneshot::channel();
        pending.insert(RequestId::new(), orphan_tx).unwrap();
        drop(tx);

        assert_eq!(exit_rx.await.unwrap(), EXIT_CAUSE);
        assert!(orphan_rx.await.unwrap().is_err());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn fatal_before_ready_fails_boot() {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(PendingTable::new("weather"));
        let (boot_tx, boot_rx) = oneshot::channel();

        let handle = spawn_reader(
            "weather".to_string(),
            Generation::new(1),
            rx,
            pending,
            boot_tx,
            |_| {},
        );
        tx.send(frame(&UnitMessage::Fatal {
            error: "no network".to_string(),
        }))
        .unwrap();
        drop(tx);

        assert_eq!(boot_rx.await.unwrap().unwrap_err(), "no network");
        handle.await.unwrap();
    }
}
