//! Backend health state and the shared registry.
//!
//! # States
//! - Alive: backend receives traffic
//! - Dead: backend excluded from selection until a probe passes
//!
//! # State Transitions
//! ```text
//! Alive → Dead: liveness probe fails (bad status, content mismatch, error)
//! Dead → Alive: liveness probe passes
//! ```
//!
//! # Design Decisions
//! - Backends start alive; they serve traffic until the first probe verdict
//! - Aliveness (probe verdict) and circuit state (failure streak) are
//!   tracked separately and both consulted during selection
//! - Registry entries are keyed by backend id and pruned when the
//!   backend disappears from configuration

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::resilience::FailureStats;

/// Liveness state for one backend, updated by the prober.
#[derive(Debug)]
pub struct HealthState {
    alive: AtomicBool,
    last_checked_ms: AtomicU64,
    last_content: Mutex<Option<String>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            alive: AtomicBool::new(true),
            last_checked_ms: AtomicU64::new(0),
            last_content: Mutex::new(None),
        }
    }
}

impl HealthState {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// Unix millis of the last completed probe, 0 before the first one.
    pub fn last_checked_ms(&self) -> u64 {
        self.last_checked_ms.load(Ordering::Relaxed)
    }

    /// Body of the last probe response, when one was captured.
    pub fn last_content(&self) -> Option<String> {
        self.last_content.lock().ok().and_then(|c| c.clone())
    }

    fn apply(&self, alive: bool, content: Option<String>) {
        self.alive.store(alive, Ordering::Relaxed);
        self.last_checked_ms.store(now_ms(), Ordering::Relaxed);
        if let Ok(mut slot) = self.last_content.lock() {
            *slot = content;
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Everything tracked for one backend: probe verdicts and failure streak.
#[derive(Debug, Default)]
pub struct BackendHealth {
    pub state: HealthState,
    pub stats: FailureStats,
}

/// Shared registry of per-backend health, keyed by backend id.
///
/// Lookups for unknown backends are optimistic: alive and not tripped.
/// A backend that was never probed should not be excluded from traffic.
pub struct HealthRegistry {
    entries: DashMap<String, Arc<BackendHealth>>,
    trip_threshold: u32,
}

impl HealthRegistry {
    pub fn new(trip_threshold: u32) -> Self {
        Self {
            entries: DashMap::new(),
            trip_threshold,
        }
    }

    pub fn trip_threshold(&self) -> u32 {
        self.trip_threshold
    }

    /// Get or create the entry for a backend.
    pub fn entry(&self, backend: &str) -> Arc<BackendHealth> {
        if let Some(existing) = self.entries.get(backend) {
            return Arc::clone(existing.value());
        }
        self.entries
            .entry(backend.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// The entry for a backend, if it is tracked.
    pub fn get(&self, backend: &str) -> Option<Arc<BackendHealth>> {
        self.entries.get(backend).map(|e| Arc::clone(e.value()))
    }

    /// Probe verdict for a backend. Untracked backends count as alive.
    pub fn is_alive(&self, backend: &str) -> bool {
        self.entries
            .get(backend)
            .map(|e| e.state.is_alive())
            .unwrap_or(true)
    }

    /// Circuit state for a backend. Untracked backends are not tripped.
    pub fn is_tripped(&self, backend: &str) -> bool {
        self.entries
            .get(backend)
            .map(|e| e.stats.is_open())
            .unwrap_or(false)
    }

    /// Record a success. Returns true when it closed an open circuit.
    pub fn record_success(&self, backend: &str) -> bool {
        self.entry(backend).stats.record_success()
    }

    /// Record a failure. Returns true when it tripped the circuit.
    pub fn record_failure(&self, backend: &str) -> bool {
        self.entry(backend).stats.record_failure(self.trip_threshold)
    }

    /// Store a probe verdict and feed it through the failure stats.
    ///
    /// Returns true when the verdict flipped the circuit in either
    /// direction so the caller can log the transition.
    pub fn apply_probe(&self, backend: &str, alive: bool, content: Option<String>) -> bool {
        let entry = self.entry(backend);
        entry.state.apply(alive, content);
        if alive {
            entry.stats.record_success()
        } else {
            entry.stats.record_failure(self.trip_threshold)
        }
    }

    /// Drop entries for backends no longer present in configuration.
    pub fn retain_ids(&self, live: &[String]) {
        self.entries.retain(|id, _| live.iter().any(|l| l == id));
    }

    /// All tracked backend ids.
    pub fn tracked_ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_backend_is_optimistic() {
        let registry = HealthRegistry::new(3);
        assert!(registry.is_alive("never-seen"));
        assert!(!registry.is_tripped("never-seen"));
    }

    #[test]
    fn test_apply_probe_updates_state() {
        let registry = HealthRegistry::new(3);
        registry.apply_probe("b1", false, None);
        assert!(!registry.is_alive("b1"));
        assert!(registry.get("b1").unwrap().state.last_checked_ms() > 0);

        registry.apply_probe("b1", true, Some("OK".to_string()));
        assert!(registry.is_alive("b1"));
        assert_eq!(registry.get("b1").unwrap().state.last_content().as_deref(), Some("OK"));
    }

    #[test]
    fn test_failed_probes_trip_circuit() {
        let registry = HealthRegistry::new(3);
        assert!(!registry.apply_probe("b1", false, None));
        assert!(!registry.apply_probe("b1", false, None));
        assert!(registry.apply_probe("b1", false, None));
        assert!(registry.is_tripped("b1"));

        // recovery closes it again
        assert!(registry.apply_probe("b1", true, None));
        assert!(!registry.is_tripped("b1"));
    }

    #[test]
    fn test_probe_and_request_failures_share_the_streak() {
        let registry = HealthRegistry::new(3);
        registry.apply_probe("b1", false, None);
        registry.record_failure("b1");
        assert!(registry.record_failure("b1"));
        assert!(registry.is_tripped("b1"));
    }

    #[test]
    fn test_retain_ids_prunes_vanished_backends() {
        let registry = HealthRegistry::new(3);
        registry.apply_probe("b1", true, None);
        registry.apply_probe("b2", false, None);
        registry.retain_ids(&["b1".to_string()]);
        assert!(registry.get("b2").is_none());
        assert!(registry.get("b1").is_some());
        // pruned backend is optimistic again if it comes back
        assert!(registry.is_alive("b2"));
    }

    #[test]
    fn test_entry_is_shared_not_replaced() {
        let registry = HealthRegistry::new(3);
        let first = registry.entry("b1");
        first.stats.record_failure(3);
        let second = registry.entry("b1");
        assert_eq!(second.stats.failures(), 1);
    }
}
