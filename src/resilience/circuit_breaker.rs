//! Per-backend circuit breaker.
//!
//! # States
//! - Closed: normal operation, the backend is selectable
//! - Open: the backend failed too often in a row, selection skips it
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures reaches trip_threshold
//! Open → Closed: any success (a passing probe or a forwarded request)
//! ```
//!
//! # Design Decisions
//! - Per-backend breaker (not global); all state is lock-free atomics
//! - The open flag always mirrors `consecutive_failures >= threshold`
//! - No half-open timer: the liveness prober keeps exercising tripped
//!   backends, so recovery rides on the next passing probe

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::health::HealthRegistry;

/// Failure tracking for one backend.
#[derive(Debug, Default)]
pub struct FailureStats {
    consecutive_failures: AtomicU32,
    circuit_open: AtomicBool,
    last_failure_ms: AtomicU64,
}

impl FailureStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure. Returns true when this failure tripped the circuit.
    pub fn record_failure(&self, threshold: u32) -> bool {
        self.last_failure_ms.store(now_ms(), Ordering::Relaxed);
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= threshold {
            // swap tells us whether we were the ones who opened it
            !self.circuit_open.swap(true, Ordering::Relaxed)
        } else {
            false
        }
    }

    /// Record one success. Returns true when this closed an open circuit.
    pub fn record_success(&self) -> bool {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.circuit_open.swap(false, Ordering::Relaxed)
    }

    /// Current consecutive failure count.
    pub fn failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Whether the circuit is open.
    pub fn is_open(&self) -> bool {
        self.circuit_open.load(Ordering::Relaxed)
    }

    /// Unix millis of the last recorded failure, 0 before the first one.
    pub fn last_failure_ms(&self) -> u64 {
        self.last_failure_ms.load(Ordering::Relaxed)
    }

    /// Point-in-time copy for the admin API.
    pub fn snapshot(&self) -> FailureSnapshot {
        FailureSnapshot {
            consecutive_failures: self.failures(),
            circuit_open: self.is_open(),
            last_failure_ms: self.last_failure_ms(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Serializable view of one backend's failure state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureSnapshot {
    pub consecutive_failures: u32,
    pub circuit_open: bool,
    pub last_failure_ms: u64,
}

/// Facade over the health registry for callers that only care about
/// trip state and outcome reporting (selection and forwarding).
#[derive(Clone)]
pub struct CircuitBreaker {
    registry: Arc<HealthRegistry>,
}

impl CircuitBreaker {
    pub fn new(registry: Arc<HealthRegistry>) -> Self {
        Self { registry }
    }

    /// Whether the backend's circuit is open. Unknown backends are closed.
    pub fn is_tripped(&self, backend: &str) -> bool {
        self.registry.is_tripped(backend)
    }

    /// Report a successful interaction with the backend.
    pub fn record_success(&self, backend: &str) {
        if self.registry.record_success(backend) {
            tracing::info!(backend = %backend, "Circuit closed, backend back in rotation");
        }
    }

    /// Report a failed interaction with the backend.
    pub fn record_failure(&self, backend: &str) {
        if self.registry.record_failure(backend) {
            tracing::warn!(
                backend = %backend,
                threshold = self.registry.trip_threshold(),
                "Circuit opened, backend removed from rotation"
            );
        }
    }

    /// Failure state for one backend, if it is tracked.
    pub fn failure_snapshot(&self, backend: &str) -> Option<FailureSnapshot> {
        self.registry.get(backend).map(|h| h.stats.snapshot())
    }
}
