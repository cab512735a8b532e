//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, pool sizes > 0)
//! - Validate addresses and log directives
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use tokio::sync::Semaphore;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} = {value} exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("{field} is not a socket address: {value}")]
    BadAddress { field: &'static str, value: String },

    #[error("unknown log level: {0}")]
    BadLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let t = &config.transport;

    for (field, value) in [
        ("transport.connect_timeout_ms", t.connect_timeout_ms),
        ("transport.socket_timeout_ms", t.socket_timeout_ms),
        ("transport.pool_acquire_timeout_ms", t.pool_acquire_timeout_ms),
        ("transport.max_total", t.max_total as u64),
        ("transport.max_per_route", t.max_per_route as u64),
        ("server.request_timeout_secs", config.server.request_timeout_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    // Connection limits back semaphores, which cap their permit count.
    for (field, value) in [
        ("transport.max_total", t.max_total),
        ("transport.max_per_route", t.max_per_route),
    ] {
        if value > Semaphore::MAX_PERMITS {
            errors.push(ValidationError::TooLarge {
                field,
                value,
                max: Semaphore::MAX_PERMITS,
            });
        }
    }

    for (field, value) in [
        ("server.bind_address", &config.server.bind_address),
        ("observability.metrics_address", &config.observability.metrics_address),
    ] {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::BadAddress { field, value: value.clone() });
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::BadLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
