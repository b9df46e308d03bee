//! Side-channel export bag.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Key under which a human readable run summary is exported.
pub const SUMMARY_KEY: &str = "$summary";

/// Values exported by connector code during one invocation.
///
/// Clones share the same bag, so methods called through `AppMethods` export
/// into the invocation that called them. After the entry point completes
/// the bag is merged over its return value.
#[derive(Debug, Clone, Default)]
pub struct Exports {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl Exports {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a named value. A later export under the same name wins.
    pub fn export(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.inner.lock().insert(name.into(), value.into());
    }

    /// Export the run summary.
    pub fn summary(&self, text: impl Into<String>) {
        self.export(SUMMARY_KEY, Value::String(text.into()));
    }

    /// Read one exported value.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.lock().get(name).cloned()
    }

    /// Copy out everything exported so far.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.lock().clone()
    }

    /// Whether nothing has been exported.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
