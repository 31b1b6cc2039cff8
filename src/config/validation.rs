//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check required fields are present (credentials, endpoints, node list)
//! - Validate value ranges (delays, poll frequency, ports)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CanaryConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::CanaryConfig;

/// A single semantic problem with a loaded config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is empty or zero.
    Missing(&'static str),
    /// The write/read delay does not fit inside one poll period.
    InvalidDelay,
    /// The poll frequency is below one second.
    InvalidPollFrequency,
    /// A listen address is not `ip:port`.
    InvalidAddress {
        field: &'static str,
        value: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Missing(field) => write!(f, "{} must be set", field),
            ValidationError::InvalidDelay => {
                write!(f, "WriteReadDelay must be less than the PollFrequency")
            }
            ValidationError::InvalidPollFrequency => {
                write!(f, "PollFrequency must be at least 1 second")
            }
            ValidationError::InvalidAddress { field, value } => {
                write!(f, "{} is not a valid ip:port address: {:?}", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a deserialized config, collecting every problem.
pub fn validate_config(config: &CanaryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.poll_frequency_secs < 1 {
        errors.push(ValidationError::InvalidPollFrequency);
    }
    if config.write_read_delay_secs == 0 {
        errors.push(ValidationError::Missing("write_read_delay_secs"));
    }
    if config.poll_frequency_secs <= config.write_read_delay_secs {
        errors.push(ValidationError::InvalidDelay);
    }

    let required = [
        ("mysql.port", config.mysql.port != 0),
        ("mysql.galera_healthcheck_port", config.mysql.galera_healthcheck_port != 0),
        ("mysql.cluster_ips", !config.mysql.cluster_ips.is_empty()),
        ("canary.database", !config.canary.database.is_empty()),
        ("canary.username", !config.canary.username.is_empty()),
        ("canary.password", !config.canary.password.is_empty()),
        ("switchboard.urls", !config.switchboard.urls.is_empty()),
        ("switchboard.username", !config.switchboard.username.is_empty()),
        ("switchboard.password", !config.switchboard.password.is_empty()),
    ];
    for (field, present) in required {
        if !present {
            errors.push(ValidationError::Missing(field));
        }
    }

    let n = &config.notifications;
    let notifications = [
        ("notifications.admin_client_username", &n.admin_client_username),
        ("notifications.admin_client_secret", &n.admin_client_secret),
        ("notifications.client_username", &n.client_username),
        ("notifications.client_secret", &n.client_secret),
        ("notifications.notifications_domain", &n.notifications_domain),
        ("notifications.uaa_domain", &n.uaa_domain),
        ("notifications.to_address", &n.to_address),
        ("notifications.system_domain", &n.system_domain),
        ("notifications.cluster_identifier", &n.cluster_identifier),
    ];
    for (field, value) in notifications {
        if value.is_empty() {
            errors.push(ValidationError::Missing(field));
        }
    }

    if config.tls.enabled {
        if config.tls.certificate.is_empty() {
            errors.push(ValidationError::Missing("tls.certificate"));
        }
        if config.tls.private_key.is_empty() {
            errors.push(ValidationError::Missing("tls.private_key"));
        }
    }

    if config.api_address().parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "bind_address",
            value: config.api_address(),
        });
    }
    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "metrics.address",
            value: config.metrics.address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
