//! Refreshable route table.
//!
//! # Responsibilities
//! - Merge static (config) routes with dynamically supplied ones
//! - Resolve request paths to services, first match wins
//! - Swap in rebuilt tables atomically on refresh
//!
//! # Design Decisions
//! - Merge preserves static ordering; a dynamic route with the same
//!   pattern overrides the static one in place, new patterns append
//! - Patterns compile at build time; a malformed supplied pattern is
//!   skipped with a warning instead of poisoning the whole table
//! - Readers hold an immutable snapshot, so resolution during a
//!   refresh sees either the old table or the new one, never a mix

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::config::schema::RouteEntry;
use crate::load_balancer::ServiceId;
use crate::routing::pattern::PathPattern;

/// Where a route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    Static,
    Dynamic,
}

/// One compiled route in the merged table.
#[derive(Debug)]
pub struct Route {
    pattern: PathPattern,
    service: ServiceId,
    source: RouteSource,
}

impl Route {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn service(&self) -> &ServiceId {
        &self.service
    }

    pub fn source(&self) -> RouteSource {
        self.source
    }
}

/// Source of dynamically supplied routes.
pub trait RouteSupplier: Send + Sync {
    fn routes(&self) -> Vec<RouteEntry>;
}

/// In-memory supplier fed through the admin API.
#[derive(Default)]
pub struct DynamicRoutes {
    entries: ArcSwap<Vec<RouteEntry>>,
}

impl DynamicRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the supplied route set.
    pub fn replace(&self, entries: Vec<RouteEntry>) {
        self.entries.store(Arc::new(entries));
    }
}

impl RouteSupplier for DynamicRoutes {
    fn routes(&self) -> Vec<RouteEntry> {
        self.entries.load().as_ref().clone()
    }
}

/// The merged, refreshable route table.
pub struct RouteTable {
    static_routes: ArcSwap<Vec<RouteEntry>>,
    supplier: Arc<dyn RouteSupplier>,
    merged: ArcSwap<Vec<Arc<Route>>>,
}

impl RouteTable {
    /// Build a table from static routes and a dynamic supplier.
    pub fn new(static_routes: Vec<RouteEntry>, supplier: Arc<dyn RouteSupplier>) -> Self {
        let table = Self {
            static_routes: ArcSwap::from_pointee(static_routes),
            supplier,
            merged: ArcSwap::from_pointee(Vec::new()),
        };
        table.refresh();
        table
    }

    /// Rebuild the merged table from static routes plus the supplier.
    pub fn refresh(&self) {
        let static_routes = self.static_routes.load_full();
        let dynamic = self.supplier.routes();

        let mut entries: Vec<(RouteEntry, RouteSource)> = static_routes
            .iter()
            .cloned()
            .map(|e| (e, RouteSource::Static))
            .collect();

        for entry in dynamic {
            match entries.iter_mut().find(|(e, _)| e.pattern == entry.pattern) {
                Some(slot) => *slot = (entry, RouteSource::Dynamic),
                None => entries.push((entry, RouteSource::Dynamic)),
            }
        }

        let mut merged = Vec::with_capacity(entries.len());
        for (entry, source) in entries {
            match PathPattern::parse(&entry.pattern) {
                Ok(pattern) => merged.push(Arc::new(Route {
                    pattern,
                    service: entry.service,
                    source,
                })),
                Err(e) => {
                    tracing::warn!(
                        pattern = %entry.pattern,
                        error = %e,
                        "Skipping route with malformed pattern"
                    );
                }
            }
        }

        tracing::info!(routes = merged.len(), "Route table refreshed");
        self.merged.store(Arc::new(merged));
    }

    /// Replace the static route set (config reload) and rebuild.
    pub fn reload_static(&self, routes: Vec<RouteEntry>) {
        self.static_routes.store(Arc::new(routes));
        self.refresh();
    }

    /// Resolve a request path to its first matching route.
    pub fn resolve(&self, path: &str) -> Option<Arc<Route>> {
        self.merged
            .load()
            .iter()
            .find(|route| route.pattern.is_match(path))
            .cloned()
    }

    /// Current merged table, in match order.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Route>>> {
        self.merged.load_full()
    }
}
