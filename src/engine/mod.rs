//! Decision core wiring.
//!
//! # Data Flow
//! ```text
//! Request (path, client IP)
//!     → facade.rs (resolve route, pick backend, one call)
//!     → registry.rs (live backend snapshots per service)
//!     → strategy + circuit breaker (skip tripped backends)
//!     → RoutingDecision or RouteError
//!
//! Refresh (config reload, admin trigger):
//!     → route table rebuild + registry snapshot rebuild
//! ```
//!
//! # Design Decisions
//! - All cross-subsystem wiring lives here; the HTTP layer only ever
//!   talks to the facade
//! - Explicit construction, no global registries

pub mod facade;
pub mod registry;

pub use facade::{RouteError, RoutingDecision, RoutingEngine};
pub use registry::ServiceRegistry;
