//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing services)
//! - Validate value ranges (intervals > 0, threshold >= 1)
//! - Reject unknown strategy and probe kind names before startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: EdgeConfig -> Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system; dynamic route updates
//!   go through the same pattern checks at the admin boundary

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::health::known_probe_kind;
use crate::load_balancer::{known_strategy, ServiceId};
use crate::routing::{PathPattern, PatternError};

/// A single semantic problem found in a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route pattern {pattern:?} is invalid: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: PatternError,
    },

    #[error("route {pattern:?} references unknown service {service}")]
    UnknownService {
        pattern: String,
        service: ServiceId,
    },

    #[error("service {0} is defined more than once")]
    DuplicateService(ServiceId),

    #[error("service {service} has an empty server address")]
    EmptyServer { service: ServiceId },

    #[error("unknown load balancer strategy {0:?}")]
    UnknownStrategy(String),

    #[error("unknown probe kind {0:?}")]
    UnknownProbeKind(String),

    #[error("probe interval must be greater than zero")]
    ZeroProbeInterval,

    #[error("probe timeout must be greater than zero")]
    ZeroProbeTimeout,

    #[error("circuit trip threshold must be at least 1")]
    ZeroTripThreshold,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for service in &config.services {
        if !seen.insert(service.name.clone()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        for server in &service.servers {
            if server.trim().is_empty() {
                errors.push(ValidationError::EmptyServer {
                    service: service.name.clone(),
                });
            }
        }
    }

    for route in &config.routes {
        if let Err(reason) = PathPattern::parse(&route.pattern) {
            errors.push(ValidationError::InvalidPattern {
                pattern: route.pattern.clone(),
                reason,
            });
        }
        if !seen.contains(&route.service) {
            errors.push(ValidationError::UnknownService {
                pattern: route.pattern.clone(),
                service: route.service.clone(),
            });
        }
    }

    if !known_strategy(&config.load_balancer.strategy) {
        errors.push(ValidationError::UnknownStrategy(
            config.load_balancer.strategy.clone(),
        ));
    }

    if config.probe.enabled {
        if !known_probe_kind(&config.probe.kind) {
            errors.push(ValidationError::UnknownProbeKind(config.probe.kind.clone()));
        }
        if config.probe.interval_secs == 0 {
            errors.push(ValidationError::ZeroProbeInterval);
        }
        if config.probe.timeout_secs == 0 {
            errors.push(ValidationError::ZeroProbeTimeout);
        }
    }

    if config.circuit.trip_threshold == 0 {
        errors.push(ValidationError::ZeroTripThreshold);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
