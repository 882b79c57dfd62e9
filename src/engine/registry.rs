//! Service registry: services mapped to live backend snapshots.
//!
//! # Responsibilities
//! - Materialize provider addresses into backend descriptors
//! - Keep one immutable snapshot per service, swapped on refresh
//! - Prune health state for backends that left the configuration
//!
//! # Design Decisions
//! - Snapshots are sorted by backend id and deduplicated, so selection
//!   sees the same ring regardless of config file ordering
//! - Refresh rebuilds each snapshot off to the side and swaps it in
//!   whole; readers never observe a partially updated pool
//! - Reachability is evaluated at read time against the health registry,
//!   not baked into the snapshot

use std::sync::Arc;

use dashmap::DashMap;

use crate::health::HealthRegistry;
use crate::load_balancer::{BackendDescriptor, ServerProvider, ServiceId};

pub struct ServiceRegistry {
    provider: Arc<dyn ServerProvider>,
    snapshots: DashMap<ServiceId, Arc<Vec<Arc<BackendDescriptor>>>>,
    health: Arc<HealthRegistry>,
}

impl ServiceRegistry {
    /// Build a registry and materialize the initial snapshots.
    pub fn new(provider: Arc<dyn ServerProvider>, health: Arc<HealthRegistry>) -> Self {
        let registry = Self {
            provider,
            snapshots: DashMap::new(),
            health,
        };
        registry.refresh();
        registry
    }

    /// Rebuild every service snapshot from the provider.
    pub fn refresh(&self) {
        let services = self.provider.services();

        for service in &services {
            let mut servers = self.provider.servers(service);
            servers.sort();
            servers.dedup();

            let backends: Vec<Arc<BackendDescriptor>> = servers
                .into_iter()
                .map(|server| Arc::new(BackendDescriptor::new(server, service.clone())))
                .collect();

            // warm health entries so the prober and admin see the
            // backend before its first probe
            for backend in &backends {
                self.health.entry(backend.id());
            }

            tracing::debug!(
                service = %service,
                backends = backends.len(),
                "Service snapshot rebuilt"
            );
            self.snapshots.insert(service.clone(), Arc::new(backends));
        }

        self.snapshots.retain(|id, _| services.contains(id));

        let live: Vec<String> = self
            .snapshots
            .iter()
            .flat_map(|entry| {
                entry
                    .value()
                    .iter()
                    .map(|b| b.id().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        self.health.retain_ids(&live);

        tracing::info!(
            services = services.len(),
            backends = live.len(),
            "Service registry refreshed"
        );
    }

    /// Snapshot of all backends for a service, in stable id order.
    pub fn backends(&self, service: &ServiceId) -> Arc<Vec<Arc<BackendDescriptor>>> {
        self.snapshots
            .get(service)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_default()
    }

    /// Backends whose last probe verdict left them alive.
    pub fn reachable(&self, service: &ServiceId) -> Vec<Arc<BackendDescriptor>> {
        self.backends(service)
            .iter()
            .filter(|b| self.health.is_alive(b.id()))
            .cloned()
            .collect()
    }

    /// Every backend across all services (the prober sweeps these).
    pub fn all_backends(&self) -> Vec<Arc<BackendDescriptor>> {
        self.snapshots
            .iter()
            .flat_map(|entry| entry.value().iter().cloned().collect::<Vec<_>>())
            .collect()
    }

    /// All registered services.
    pub fn services(&self) -> Vec<ServiceId> {
        self.snapshots.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Shared health registry backing this registry.
    pub fn health(&self) -> &Arc<HealthRegistry> {
        &self.health
    }
}
