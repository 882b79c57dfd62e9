//! Routing engine facade.
//!
//! # Responsibilities
//! - Resolve a request path and pick a backend in one call
//! - Report forwarded-request outcomes back into the circuit state
//! - Drive refreshes of the route table and service snapshots
//!
//! # Design Decisions
//! - Routing is a pure lookup over current snapshots; it never blocks
//!   on probes or refreshes
//! - "No route" and "no backend" are values, not panics; the HTTP layer
//!   maps them to 404 and 503
//! - The client key is the peer IP, so affinity holds across keep-alive
//!   connections and ports

use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::engine::registry::ServiceRegistry;
use crate::load_balancer::{
    BackendDescriptor, SelectionContext, SelectionStrategy, ServiceId,
};
use crate::resilience::CircuitBreaker;
use crate::routing::{Route, RouteTable};

/// Why a request could not be assigned a backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no route matches path {path:?}")]
    NoRoute { path: String },

    #[error("service {service} has no usable backend")]
    NoBackend { service: ServiceId },
}

/// One routing decision: the matched route and the chosen backend.
#[derive(Debug)]
pub struct RoutingDecision {
    pub route: Arc<Route>,
    pub backend: Arc<BackendDescriptor>,
}

/// The decision core: route table, service registry, selection strategy
/// and circuit breaker behind one surface.
pub struct RoutingEngine {
    table: Arc<RouteTable>,
    registry: Arc<ServiceRegistry>,
    strategy: Arc<dyn SelectionStrategy>,
    breaker: CircuitBreaker,
}

impl RoutingEngine {
    pub fn new(
        table: Arc<RouteTable>,
        registry: Arc<ServiceRegistry>,
        strategy: Arc<dyn SelectionStrategy>,
    ) -> Self {
        let breaker = CircuitBreaker::new(Arc::clone(registry.health()));
        Self {
            table,
            registry,
            strategy,
            breaker,
        }
    }

    /// Decide where a request goes.
    pub fn route(&self, path: &str, client: IpAddr) -> Result<RoutingDecision, RouteError> {
        let route = self.table.resolve(path).ok_or_else(|| RouteError::NoRoute {
            path: path.to_string(),
        })?;

        let service = route.service().clone();
        let candidates = self.registry.reachable(&service);
        let client_key = client.to_string();

        let ctx = SelectionContext {
            candidates: &candidates,
            client_key: &client_key,
            breaker: &self.breaker,
        };

        let backend = self
            .strategy
            .select(&ctx)
            .ok_or(RouteError::NoBackend { service })?;

        tracing::debug!(
            path = %path,
            client = %client,
            pattern = %route.pattern(),
            backend = %backend.id(),
            "Routed request"
        );

        Ok(RoutingDecision { route, backend })
    }

    /// Report that a forwarded request reached its backend.
    pub fn report_success(&self, backend: &str) {
        self.breaker.record_success(backend);
    }

    /// Report that a forwarded request failed at the transport or the
    /// backend answered like a dead one.
    pub fn report_failure(&self, backend: &str) {
        self.breaker.record_failure(backend);
    }

    /// Rebuild the route table and the service snapshots.
    pub fn refresh(&self) {
        self.table.refresh();
        self.registry.refresh();
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }
}
