//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the canary.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Placeholder written over secrets before a config is logged.
pub const REDACTED: &str = "REDACTED";

/// Root configuration for the replication canary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CanaryConfig {
    /// Cluster node addresses and ports.
    pub mysql: MySqlConfig,

    /// Credentials of the canary database user (also guards the status API).
    pub canary: CanaryCredentials,

    /// Token issuer and notification service settings.
    pub notifications: NotificationsConfig,

    /// Proxy control API endpoints.
    pub switchboard: SwitchboardConfig,

    /// Seconds to wait between writing a chirp and reading it back.
    pub write_read_delay_secs: u64,

    /// Seconds between chirp cycles.
    pub poll_frequency_secs: u64,

    /// Alert operators without disabling cluster traffic.
    pub notify_only: bool,

    /// Skip certificate verification on outbound HTTPS calls.
    pub skip_ssl_validation: bool,

    /// Status API bind host.
    pub bind_address: String,

    /// Status API port.
    pub api_port: u16,

    /// Default log filter when RUST_LOG is unset.
    pub log_level: String,

    /// Optional TLS for the status API.
    pub tls: TlsConfig,

    /// Prometheus exporter settings.
    pub metrics: MetricsConfig,

    /// Applied with `SET SESSION` before every verification read.
    pub session_variables: BTreeMap<String, String>,
}

impl CanaryConfig {
    pub fn write_read_delay(&self) -> Duration {
        Duration::from_secs(self.write_read_delay_secs)
    }

    pub fn poll_frequency(&self) -> Duration {
        Duration::from_secs(self.poll_frequency_secs)
    }

    /// Address the status API listens on. An empty bind address means all interfaces.
    pub fn api_address(&self) -> String {
        let host = if self.bind_address.is_empty() {
            "0.0.0.0"
        } else {
            self.bind_address.as_str()
        };
        format!("{}:{}", host, self.api_port)
    }

    /// Session variables for verification reads, `wsrep_sync_wait=1` when none are configured.
    pub fn effective_session_variables(&self) -> BTreeMap<String, String> {
        if self.session_variables.is_empty() {
            BTreeMap::from([("wsrep_sync_wait".to_string(), "1".to_string())])
        } else {
            self.session_variables.clone()
        }
    }

    /// Copy of the config that is safe to log.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        config.canary.password = REDACTED.to_string();
        config.switchboard.password = REDACTED.to_string();
        config.notifications.admin_client_secret = REDACTED.to_string();
        config.notifications.client_secret = REDACTED.to_string();
        config.tls.private_key = REDACTED.to_string();
        config
    }
}

/// Cluster topology.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MySqlConfig {
    /// One entry per cluster node, in check order.
    pub cluster_ips: Vec<String>,

    /// MySQL port shared by all nodes.
    pub port: u16,

    /// Port of the per-node galera healthcheck agent.
    pub galera_healthcheck_port: u16,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            cluster_ips: Vec::new(),
            port: 3306,
            galera_healthcheck_port: 9200,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CanaryCredentials {
    pub database: String,
    pub username: String,
    pub password: String,
}

/// UAA and notifications service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Admin client used once at startup to register `client_username`.
    pub admin_client_username: String,
    pub admin_client_secret: String,

    /// Client whose tokens authorize alert emails.
    pub client_username: String,
    pub client_secret: String,

    pub notifications_domain: String,
    pub uaa_domain: String,
    pub to_address: String,
    pub system_domain: String,
    pub cluster_identifier: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SwitchboardConfig {
    /// Root URL of each proxy instance, in resolution order.
    pub urls: Vec<String>,
    pub username: String,
    pub password: String,
}

/// TLS configuration for the status API. PEM material is inline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    pub enabled: bool,
    pub certificate: String,
    pub private_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics endpoint.
    pub enabled: bool,

    /// Metrics endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}
