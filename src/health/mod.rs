//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Active probes (prober.rs):
//!     Periodic timer
//!     → Probe each backend (HTTP status + body, or TCP connect)
//!     → Apply verdict to state.rs
//!
//! Passive feedback (data path):
//!     Forwarded request outcome observed
//!     → record_success / record_failure on the registry
//!     → Circuit trips after consecutive failures
//!
//! State (state.rs):
//!     Alive ←→ Dead  (probe verdicts)
//!     Closed ←→ Open (failure streaks)
//! ```
//!
//! # Design Decisions
//! - Active probes and passive feedback share one failure streak
//! - Health state is per-backend, not per-pool
//! - Backends are optimistic until the first verdict arrives

pub mod prober;
pub mod state;

pub use prober::{
    build_probe, known_probe_kind, HealthProbe, HealthProber, HttpProbe, ProbeInitError,
    ProbeReport, TcpProbe,
};
pub use state::{BackendHealth, HealthRegistry, HealthState};
