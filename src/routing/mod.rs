//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → table.rs (ordered lookup over the merged table)
//!     → pattern.rs (glob match per route)
//!     → Return: matched Route or none
//!
//! Table Build (startup and refresh):
//!     static RouteEntry[] + supplied RouteEntry[]
//!     → merge (dynamic overrides same pattern in place, else appends)
//!     → compile patterns
//!     → swap in as immutable snapshot
//! ```
//!
//! # Design Decisions
//! - Tables are immutable snapshots, rebuilt whole on refresh
//! - No regex in hot path (segment globs only)
//! - Deterministic: same path always matches the same route
//! - First match wins, in merged order

pub mod pattern;
pub mod table;

pub use pattern::{PathPattern, PatternError};
pub use table::{DynamicRoutes, Route, RouteSource, RouteSupplier, RouteTable};
