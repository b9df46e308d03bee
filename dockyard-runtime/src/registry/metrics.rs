//! Registry counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters for a registry.
#[derive(Debug, Default)]
pub struct RegistryMetrics {
    /// Units that reached `ready`.
    pub units_booted: AtomicU64,
    /// Registrations that failed before the unit went live.
    pub boot_failures: AtomicU64,
    /// Live units that exited without being asked to.
    pub crashes: AtomicU64,
    /// Option and run calls issued.
    pub invocations: AtomicU64,
    /// Option and run calls that failed.
    pub invocation_failures: AtomicU64,
    /// Boot and RPC timeouts.
    pub timeouts: AtomicU64,
}

impl RegistryMetrics {
    /// Record a unit reaching `ready`.
    pub fn record_boot(&self) {
        self.units_booted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed registration.
    pub fn record_boot_failure(&self, timed_out: bool) {
        self.boot_failures.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an unexpected unit exit.
    pub fn record_crash(&self) {
        self.crashes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an invocation start.
    pub fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an invocation failure.
    pub fn record_invocation_failure(&self, timed_out: bool) {
        self.invocation_failures.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timeouts.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            units_booted: self.units_booted.load(Ordering::Relaxed),
            boot_failures: self.boot_failures.load(Ordering::Relaxed),
            crashes: self.crashes.load(Ordering::Relaxed),
            invocations: self.invocations.load(Ordering::Relaxed),
            invocation_failures: self.invocation_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Serializable view of [`RegistryMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Units that reached `ready`.
    pub units_booted: u64,
    /// Registrations that failed.
    pub boot_failures: u64,
    /// Unexpected unit exits.
    pub crashes: u64,
    /// Calls issued.
    pub invocations: u64,
    /// Calls that failed.
    pub invocation_failures: u64,
    /// Boot and RPC timeouts.
    pub timeouts: u64,
}
