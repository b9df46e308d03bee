//! Shared application state for API handlers.

use crate::registry::ConnectorRegistry;
use std::time::Instant;

/// Shared application state passed to all handlers.
pub struct AppState {
    /// The connector registry.
    pub registry: ConnectorRegistry,
    /// Server start time.
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state.
    pub fn new(registry: ConnectorRegistry) -> Self {
        Self {
            registry,
            start_time: Instant::now(),
        }
    }

    /// Seconds since the server started.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
