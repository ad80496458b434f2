//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacity > 0, ports non-zero)
//! - Detect front ends configured on the same port
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: NodeSettings → Result<(), Vec<ValidationError>>
//! - Runs before settings are accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{NodeSettings, StoreKind};

/// A single semantic problem found in the settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pool.capacity must be at least 1")]
    ZeroPoolCapacity,

    #[error("{0}.port must be non-zero")]
    ZeroPort(&'static str),

    #[error("{first}.port and {second}.port both use port {port}")]
    PortConflict {
        first: &'static str,
        second: &'static str,
        port: u16,
    },

    #[error("store.location must be set for a local store")]
    MissingStoreLocation,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check the settings for semantic errors.
pub fn validate_config(settings: &NodeSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.pool.capacity == 0 {
        errors.push(ValidationError::ZeroPoolCapacity);
    }

    let ports = [
        ("rest", settings.rest.port),
        ("webapp", settings.webapp.port),
        ("webdav", settings.webdav.port),
    ];

    for (name, port) in ports {
        if port == 0 {
            errors.push(ValidationError::ZeroPort(name));
        }
    }

    for (i, (first, a)) in ports.iter().enumerate() {
        for (second, b) in &ports[i + 1..] {
            if *a != 0 && a == b {
                errors.push(ValidationError::PortConflict {
                    first: *first,
                    second: *second,
                    port: *a,
                });
            }
        }
    }

    if settings.store.kind == StoreKind::Local && settings.store.location.as_os_str().is_empty() {
        errors.push(ValidationError::MissingStoreLocation);
    }

    if settings.observability.metrics_enabled
        && settings
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            settings.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
