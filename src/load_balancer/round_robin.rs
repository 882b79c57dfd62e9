//! Round-robin selection strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::affinity::{SelectionContext, SelectionStrategy};
use crate::load_balancer::descriptor::BackendDescriptor;

/// Round-robin selector.
/// Stores an internal counter to rotate through backends, skipping
/// tripped ones for at most one full revolution.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn select(&self, ctx: &SelectionContext<'_>) -> Option<Arc<BackendDescriptor>> {
        let len = ctx.candidates.len();
        if len == 0 {
            return None;
        }

        let start = self.counter.fetch_add(1, Ordering::Relaxed);
        for step in 0..len {
            let candidate = &ctx.candidates[(start + step) % len];
            if !ctx.breaker.is_tripped(candidate.id()) {
                return Some(Arc::clone(candidate));
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "round-robin"
    }
}
