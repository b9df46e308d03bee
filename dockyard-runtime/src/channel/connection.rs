//! Host-side handle for calling into a unit.

use super::pending::PendingTable;
use dockyard_core::error::{DockyardError, Result};
use dockyard_core::protocol::{self, HostMessage, Operation, Request};
use dockyard_core::types::{Generation, RequestId};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

/// Issues requests to one execution unit and awaits their responses.
#[derive(Clone)]
pub struct UnitConnection {
    slug: String,
    generation: Generation,
    outbound: UnboundedSender<String>,
    pending: Arc<PendingTable>,
    rpc_timeout: Duration,
}

impl UnitConnection {
    /// Wrap the outbound half of a unit's channel.
    pub fn new(
        slug: impl Into<String>,
        generation: Generation,
        outbound: UnboundedSender<String>,
        pending: Arc<PendingTable>,
        rpc_timeout: Duration,
    ) -> Self {
        Self {
            slug: slug.into(),
            generation,
            outbound,
            pending,
            rpc_timeout,
        }
    }

    /// The slug the unit serves.
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// The registration generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The unit's outstanding requests.
    pub fn pending(&self) -> &Arc<PendingTable> {
        &self.pending
    }

    /// Send a request and wait for its response.
    ///
    /// Fails with `RpcTimeout` when no response arrives within the RPC
    /// timeout and with `UnitCrashed` when the unit exits first. A response
    /// arriving after the timeout is discarded.
    pub async fn call(&self, operation: Operation) -> Result<Value> {
        let name = operation.name();
        let request = Request::new(operation);
        let id = request.id;

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx)?;
        let _settle = Settle {
            table: &self.pending,
            id,
        };

        let frame = protocol::encode(&HostMessage::Request(request))?;
        if self.outbound.send(frame).is_err() {
            return Err(DockyardError::UnitCrashed {
                slug: self.slug.clone(),
                cause: "execution unit is not accepting requests".to_string(),
            });
        }
        tracing::trace!(slug = %self.slug, request_id = %id, operation = name, "Request sent");

        match tokio::time::timeout(self.rpc_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(DockyardError::UnitCrashed {
                slug: self.slug.clone(),
                cause: "response channel dropped".to_string(),
            }),
            Err(_) => {
                tracing::warn!(
                    slug = %self.slug,
                    request_id = %id,
                    operation = name,
                    timeout_ms = self.rpc_timeout.as_millis() as u64,
                    "Request to execution unit timed out"
                );
                Err(DockyardError::RpcTimeout {
                    slug: self.slug.clone(),
                    operation: name.to_string(),
                    timeout_ms: self.rpc_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Ask the unit to stop. Outstanding requests are rejected when it exits.
    pub fn shutdown(&self) {
        if let Ok(frame) = protocol::encode(&HostMessage::Shutdown) {
            if self.outbound.send(frame).is_err() {
                tracing::debug!(slug = %self.slug, "Execution unit already gone");
            }
        }
    }

    /// Whether the unit can still receive frames.
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed() && !self.pending.is_closed()
    }
}

impl std::fmt::Debug for UnitConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitConnection")
            .field("slug", &self.slug)
            .field("generation", &self.generation)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Removes the pending entry however the call ends, including cancellation.
struct Settle<'a> {
    table: &'a PendingTable,
    id: RequestId,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        self.table.remove(self.id);
    }
}
