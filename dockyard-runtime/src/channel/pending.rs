//! Outstanding request table.

use dockyard_core::error::{DockyardError, Result};
use dockyard_core::types::RequestId;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Where a response is delivered.
pub type Responder = oneshot::Sender<Result<Value>>;

#[derive(Default)]
struct Inner {
    waiting: HashMap<RequestId, Responder>,
    closed: Option<String>,
}

/// Requests sent to a unit that have not been answered yet.
///
/// Every entry is settled exactly once: by its response, by the caller's
/// timeout removing it, or by the unit's exit rejecting it. Once closed the
/// table refuses new entries.
pub struct PendingTable {
    slug: String,
    inner: Mutex<Inner>,
}

impl PendingTable {
    /// Create an empty table for the unit serving `slug`.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Register a request. Fails if the unit has already exited.
    pub fn insert(&self, id: RequestId, responder: Responder) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(cause) = &inner.closed {
            return Err(DockyardError::UnitCrashed {
                slug: self.slug.clone(),
                cause: cause.clone(),
            });
        }
        inner.waiting.insert(id, responder);
        Ok(())
    }

    /// Deliver a response. Returns `false` for unknown or already settled ids.
    pub fn resolve(&self, id: RequestId, outcome: Result<Value>) -> bool {
        let responder = self.inner.lock().waiting.remove(&id);
        match responder {
            Some(tx) => {
                // The caller may have given up between removal and send.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Forget a request without settling it.
    pub fn remove(&self, id: RequestId) -> bool {
        self.inner.lock().waiting.remove(&id).is_some()
    }

    /// Close the table and reject everything still waiting.
    ///
    /// Returns the number of rejected requests.
    pub fn close_and_reject_all(&self, cause: &str) -> usize {
        let drained: Vec<Responder> = {
            let mut inner = self.inner.lock();
            if inner.closed.is_none() {
                inner.closed = Some(cause.to_string());
            }
            inner.waiting.drain().map(|(_, tx)| tx).collect()
        };
        let rejected = drained.len();
        for tx in drained {
            let _ = tx.send(Err(DockyardError::UnitCrashed {
                slug: self.slug.clone(),
                cause: cause.to_string(),
            }));
        }
        rejected
    }

    /// Whether the table has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed.is_some()
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.inner.lock().waiting.len()
    }

    /// Whether no request is outstanding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolve_delivers_once() {
        let table = PendingTable::new("weather");
        let id = RequestId::new();
        let (tx, rx) = oneshot::channel();
        table.insert(id, tx).unwrap();
        assert_eq!(table.len(), 1);

        assert!(table.resolve(id, Ok(json!(1))));
        assert!(!table.resolve(id, Ok(json!(2))));
        assert_eq!(rx.await.unwrap().unwrap(), json!(1));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn close_rejects_everything_and_refuses_new_entries() {
        let table = PendingTable::new("weather");
        let mut receivers = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = oneshot::channel();
            table.insert(RequestId::new(), tx).unwrap();
            receivers.push(rx);
        }

        assert_eq!(table.close_and_reject_all("execution unit exited"), 3);
        for rx in receivers {
            let err = rx.await.unwrap().unwrap_err();
            assert_eq!(err.code(), "D203");
        }

        let (tx, _rx) = oneshot::channel();
        assert!(table.insert(RequestId::new(), tx).is_err());
        assert!(table.is_closed());
    }

    #[test]
    fn remove_forgets_without_settling() {
        let table = PendingTable::new("weather");
        let id = RequestId::new();
        let (tx, _rx) = oneshot::channel();
        table.insert(id, tx).unwrap();
        assert!(table.remove(id));
        assert!(!table.resolve(id, Ok(Value::Null)));
    }
}
