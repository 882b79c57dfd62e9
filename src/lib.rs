//! Switchboard edge proxy library.
//!
//! The decision core (route table, service registry, selection
//! strategy, circuit breaker) lives behind [`engine::RoutingEngine`];
//! the HTTP layer, prober and admin API are thin consumers of it.

pub mod admin;
pub mod config;
pub mod engine;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::EdgeConfig;
pub use engine::{RouteError, RoutingDecision, RoutingEngine};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
