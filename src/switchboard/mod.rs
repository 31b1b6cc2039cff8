//! Switchboard (proxy) control API subsystem.
//!
//! # Data Flow
//! ```text
//! Connection factory
//!     → ActiveBackendSource::active_backend_host (GET /v0/backends)
//!     → host of the backend flagged active
//!
//! Switchboard alerter
//!     → TrafficController::{disable,enable}_cluster_traffic (PATCH /v0/cluster)
//! ```
//!
//! # Design Decisions
//! - One client per proxy instance; callers iterate the list themselves
//! - Fixed five second timeout per request, no retries
//! - Any status >= 400 is an error carrying status and body

use async_trait::async_trait;
use thiserror::Error;

pub mod client;

pub use client::SwitchboardClient;

/// Errors raised by the proxy control API.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// Transport-level failure (connect, timeout, TLS, decode).
    #[error("switchboard request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured root URL does not parse.
    #[error("invalid switchboard URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Backend listing returned an error status.
    #[error("bad response ({status}) - {body}")]
    BadResponse { status: u16, body: String },

    /// Traffic toggle returned an error status.
    #[error("bad response {action} ({status}) - {body}")]
    TrafficRejected {
        action: &'static str,
        status: u16,
        body: String,
    },

    /// No backend in the listing is flagged active.
    #[error("no active backend found")]
    NoActiveBackend,
}

/// Result type for switchboard operations.
pub type SwitchboardResult<T> = Result<T, SwitchboardError>;

/// Reports which backend currently receives writes.
#[async_trait]
pub trait ActiveBackendSource: Send + Sync {
    async fn active_backend_host(&self) -> SwitchboardResult<String>;
}

/// Gates client traffic to the whole cluster.
#[async_trait]
pub trait TrafficController: Send + Sync {
    async fn enable_cluster_traffic(&self) -> SwitchboardResult<()>;

    async fn disable_cluster_traffic(&self) -> SwitchboardResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SwitchboardError::TrafficRejected {
            action: "disabling cluster",
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(err.to_string(), "bad response disabling cluster (500) - boom");

        let err = SwitchboardError::BadResponse {
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.to_string(), "bad response (401) - unauthorized");
    }
}
