//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → service identified
//!     → provider.rs (current server addresses for the service)
//!     → registry snapshot (descriptors in stable id order)
//!     → Apply selection strategy:
//!         - affinity.rs (client-hash: deterministic home + ring walk)
//!         - round_robin.rs (rotate through backends)
//!     → Return backend descriptor or none
//! ```
//!
//! # Design Decisions
//! - Strategies are stateless apart from rotation counters; health and
//!   circuit state live in the shared registry
//! - One strategy per process, chosen by name from config at startup
//! - Tripped backends are skipped during selection, dead ones are
//!   filtered out before the strategy ever sees them

pub mod affinity;
pub mod descriptor;
pub mod provider;
pub mod round_robin;

pub use affinity::{
    build_strategy, known_strategy, ClientHash, SelectionContext, SelectionStrategy,
    UnknownStrategy,
};
pub use descriptor::{BackendDescriptor, ServiceId};
pub use provider::{ServerProvider, StaticServerList};
pub use round_robin::RoundRobin;
