//! Backend server sources.
//!
//! # Responsibilities
//! - Supply the current server addresses for each service
//! - Allow the whole server set to be replaced on config reload
//!
//! # Design Decisions
//! - `ServerProvider` is a trait so discovery-backed sources can slot in
//!   next to the config-backed one without touching the registry
//! - The config-backed provider swaps its entire map atomically; readers
//!   never observe a half-applied update

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::ServiceConfig;
use crate::load_balancer::ServiceId;

/// Source of backend addresses, keyed by service.
pub trait ServerProvider: Send + Sync {
    /// All services this provider currently knows about.
    fn services(&self) -> Vec<ServiceId>;

    /// Current server addresses for a service. Empty when unknown.
    fn servers(&self, service: &ServiceId) -> Vec<String>;
}

/// Provider backed by the config file, replaceable on reload.
pub struct StaticServerList {
    services: ArcSwap<HashMap<ServiceId, Vec<String>>>,
}

impl StaticServerList {
    pub fn from_config(configs: &[ServiceConfig]) -> Self {
        Self {
            services: ArcSwap::from_pointee(build_map(configs)),
        }
    }

    /// Swap in a new server set from reloaded configuration.
    pub fn replace(&self, configs: &[ServiceConfig]) {
        self.services.store(Arc::new(build_map(configs)));
    }
}

fn build_map(configs: &[ServiceConfig]) -> HashMap<ServiceId, Vec<String>> {
    let mut map: HashMap<ServiceId, Vec<String>> = HashMap::new();
    for config in configs {
        map.entry(config.name.clone())
            .or_default()
            .extend(config.servers.iter().cloned());
    }
    map
}

impl ServerProvider for StaticServerList {
    fn services(&self) -> Vec<ServiceId> {
        self.services.load().keys().cloned().collect()
    }

    fn servers(&self, service: &ServiceId) -> Vec<String> {
        self.services
            .load()
            .get(service)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, servers: &[&str]) -> ServiceConfig {
        ServiceConfig {
            name: ServiceId::from(name),
            servers: servers.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_lookup_from_config() {
        let provider = StaticServerList::from_config(&[
            service("fly", &["localhost:9000", "localhost:9001"]),
            service("bee", &["localhost:9100"]),
        ]);

        assert_eq!(provider.servers(&ServiceId::from("fly")).len(), 2);
        assert_eq!(provider.servers(&ServiceId::from("bee")).len(), 1);
        assert!(provider.servers(&ServiceId::from("missing")).is_empty());

        let mut services = provider.services();
        services.sort();
        assert_eq!(services, vec![ServiceId::from("bee"), ServiceId::from("fly")]);
    }

    #[test]
    fn test_replace_swaps_whole_set() {
        let provider = StaticServerList::from_config(&[service("fly", &["localhost:9000"])]);
        provider.replace(&[service("wasp", &["localhost:9200"])]);

        assert!(provider.servers(&ServiceId::from("fly")).is_empty());
        assert_eq!(
            provider.servers(&ServiceId::from("wasp")),
            vec!["localhost:9200".to_string()]
        );
    }

    #[test]
    fn test_repeated_service_entries_merge() {
        let provider = StaticServerList::from_config(&[
            service("fly", &["localhost:9000"]),
            service("fly", &["localhost:9001"]),
        ]);
        assert_eq!(provider.servers(&ServiceId::from("fly")).len(), 2);
    }
}
