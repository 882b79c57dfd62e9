//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Initialize subsystems → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C received → broadcast signal → tasks drain and exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - One broadcast channel fans the shutdown signal out to every task
//! - Config reload rides the file watcher, not SIGHUP

pub mod shutdown;

pub use shutdown::{signalled, Shutdown};
