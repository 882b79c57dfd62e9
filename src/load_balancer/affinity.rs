//! Client-affine backend selection.
//!
//! # Responsibilities
//! - Map a client key to a home backend deterministically
//! - Walk the ring past tripped backends, at most once around
//!
//! # Design Decisions
//! - Strategies are trait objects built from a static name table at
//!   startup; adding one means adding a constructor row, nothing else
//! - The same client key always lands on the same home position for a
//!   given pool, so affinity survives restarts and process boundaries
//! - Selection never waits: a tripped backend is skipped, and when the
//!   whole ring is tripped selection fails fast

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

use crate::load_balancer::descriptor::BackendDescriptor;
use crate::load_balancer::round_robin::RoundRobin;
use crate::resilience::CircuitBreaker;

/// Inputs to one selection decision.
pub struct SelectionContext<'a> {
    /// Reachable candidates, in stable id order.
    pub candidates: &'a [Arc<BackendDescriptor>],
    /// Stable client key (usually the client IP).
    pub client_key: &'a str,
    /// Circuit state consulted while walking the ring.
    pub breaker: &'a CircuitBreaker,
}

/// A backend selection strategy.
pub trait SelectionStrategy: Send + Sync {
    /// Pick a backend, or None when every candidate is unusable.
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<Arc<BackendDescriptor>>;

    /// Strategy name as it appears in configuration.
    fn name(&self) -> &'static str;
}

/// Deterministic client-affine selection with bounded failover.
///
/// The client key hashes to a home position on the candidate ring.
/// Tripped backends are skipped by walking forward, wrapping at the
/// end, for at most one full revolution.
#[derive(Debug, Default)]
pub struct ClientHash;

impl ClientHash {
    pub fn new() -> Self {
        Self
    }
}

impl SelectionStrategy for ClientHash {
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<Arc<BackendDescriptor>> {
        let len = ctx.candidates.len();
        if len == 0 {
            return None;
        }

        let mut hasher = DefaultHasher::new();
        ctx.client_key.hash(&mut hasher);
        let home = (hasher.finish() % len as u64) as usize;

        for step in 0..len {
            let candidate = &ctx.candidates[(home + step) % len];
            if !ctx.breaker.is_tripped(candidate.id()) {
                if step > 0 {
                    tracing::debug!(
                        client = %ctx.client_key,
                        backend = %candidate.id(),
                        steps = step,
                        "Affine backend tripped, walked ring"
                    );
                }
                return Some(Arc::clone(candidate));
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "client-hash"
    }
}

/// Error for a strategy name with no constructor.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown load balancer strategy {0:?}")]
pub struct UnknownStrategy(pub String);

fn client_hash() -> Arc<dyn SelectionStrategy> {
    Arc::new(ClientHash::new())
}

fn round_robin() -> Arc<dyn SelectionStrategy> {
    Arc::new(RoundRobin::new())
}

/// Strategy constructors, looked up by config name at startup.
static STRATEGIES: &[(&str, fn() -> Arc<dyn SelectionStrategy>)] = &[
    ("client-hash", client_hash),
    ("round-robin", round_robin),
];

/// Whether a strategy name has a constructor.
pub fn known_strategy(name: &str) -> bool {
    STRATEGIES.iter().any(|(n, _)| *n == name)
}

/// Build the strategy configured under the given name.
pub fn build_strategy(name: &str) -> Result<Arc<dyn SelectionStrategy>, UnknownStrategy> {
    STRATEGIES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, ctor)| ctor())
        .ok_or_else(|| UnknownStrategy(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthRegistry;
    use crate::load_balancer::ServiceId;

    fn descriptors(ids: &[&str]) -> Vec<Arc<BackendDescriptor>> {
        ids.iter()
            .map(|id| Arc::new(BackendDescriptor::new(*id, ServiceId::from("svc"))))
            .collect()
    }

    fn breaker(threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(Arc::new(HealthRegistry::new(threshold)))
    }

    #[test]
    fn test_same_client_same_backend() {
        let candidates = descriptors(&["a:1", "b:2", "c:3"]);
        let breaker = breaker(3);
        let strategy = ClientHash::new();

        let ctx = SelectionContext {
            candidates: &candidates,
            client_key: "10.0.0.7",
            breaker: &breaker,
        };
        let first = strategy.select(&ctx).unwrap();
        for _ in 0..10 {
            let again = strategy.select(&ctx).unwrap();
            assert_eq!(again.id(), first.id());
        }
    }

    #[test]
    fn test_walks_past_tripped_home() {
        let candidates = descriptors(&["a:1", "b:2", "c:3"]);
        let breaker = breaker(1);
        let strategy = ClientHash::new();
        let ctx = SelectionContext {
            candidates: &candidates,
            client_key: "10.0.0.7",
            breaker: &breaker,
        };

        let home = strategy.select(&ctx).unwrap();
        breaker.record_failure(home.id());
        let next = strategy.select(&ctx).unwrap();
        assert_ne!(next.id(), home.id());

        // the walk is deterministic as well
        let again = strategy.select(&ctx).unwrap();
        assert_eq!(again.id(), next.id());
    }

    #[test]
    fn test_all_tripped_fails() {
        let candidates = descriptors(&["a:1", "b:2"]);
        let breaker = breaker(1);
        for c in &candidates {
            breaker.record_failure(c.id());
        }
        let strategy = ClientHash::new();
        let ctx = SelectionContext {
            candidates: &candidates,
            client_key: "10.0.0.7",
            breaker: &breaker,
        };
        assert!(strategy.select(&ctx).is_none());
    }

    #[test]
    fn test_empty_candidates() {
        let strategy = ClientHash::new();
        let breaker = breaker(3);
        let ctx = SelectionContext {
            candidates: &[],
            client_key: "10.0.0.7",
            breaker: &breaker,
        };
        assert!(strategy.select(&ctx).is_none());
    }

    #[test]
    fn test_distinct_clients_can_differ() {
        // with enough distinct keys at least two must map to different
        // homes on a 3-slot ring
        let candidates = descriptors(&["a:1", "b:2", "c:3"]);
        let breaker = breaker(3);
        let strategy = ClientHash::new();

        let mut seen = std::collections::HashSet::new();
        for i in 0..64 {
            let key = format!("10.0.0.{i}");
            let ctx = SelectionContext {
                candidates: &candidates,
                client_key: &key,
                breaker: &breaker,
            };
            seen.insert(strategy.select(&ctx).unwrap().id().to_string());
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_factory_table() {
        assert!(known_strategy("client-hash"));
        assert!(known_strategy("round-robin"));
        assert!(!known_strategy("coin-flip"));

        assert_eq!(build_strategy("client-hash").unwrap().name(), "client-hash");
        assert_eq!(
            build_strategy("coin-flip").unwrap_err(),
            UnknownStrategy("coin-flip".to_string())
        );
    }
}
