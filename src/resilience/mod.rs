//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request or probe outcome:
//!     → circuit_breaker.rs (track consecutive failures per backend)
//!     → trip circuit at threshold, skip backend during selection
//!     → any success resets the count and closes the circuit
//! ```
//!
//! # Design Decisions
//! - Failure state is per backend, shared between prober and data path
//! - Lock-free atomics; selection reads trip state on every request
//! - Timeouts on forwarded requests are enforced as tower middleware

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, FailureSnapshot, FailureStats};
