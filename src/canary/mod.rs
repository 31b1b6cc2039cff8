//! Replication canary and its control loop.
//!
//! # Data Flow
//! ```text
//! CoalMiner tick (coal_miner.rs)
//!     → ConnectionSource::write_conn / conns
//!     → Canary::chirp (chirp.rs)
//!         → write marker on the write node
//!         → sleep write_read_delay
//!         → read marker back on every synced node
//!         → cleanup on the write node
//!     → ChirpOutcome → StatefulStateMachine → Alerter on edges
//! ```
//!
//! # Design Decisions
//! - Outcomes are a three-way enum, so "healthy with an error" cannot be built
//! - A missing marker is the only deterministic failure signal
//! - Every other failure is indeterminate and fails open

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::database::{DatabaseError, NamedConnection};

pub mod chirp;
pub mod coal_miner;

pub use chirp::Canary;
pub use coal_miner::CoalMiner;

/// Reasons a chirp cycle could not reach a verdict.
#[derive(Debug, Error)]
pub enum CanaryError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("write connection's galera is unhealthy")]
    WriteNodeUnhealthy,
}

/// Result type for canary operations.
pub type CanaryResult<T> = Result<T, CanaryError>;

/// Verdict of one chirp cycle.
#[derive(Debug)]
pub enum ChirpOutcome {
    /// Every synced node returned the marker.
    Healthy,
    /// A synced node answered cleanly but did not have the marker.
    ReplicationFailure,
    /// Something failed before a verdict was possible.
    Indeterminate(CanaryError),
}

impl ChirpOutcome {
    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            ChirpOutcome::Healthy => "healthy",
            ChirpOutcome::ReplicationFailure => "replication_failure",
            ChirpOutcome::Indeterminate(_) => "indeterminate",
        }
    }
}

/// Runs one chirp cycle.
#[async_trait]
pub trait Chirper: Send + Sync {
    async fn chirp(
        &self,
        all_conns: &[NamedConnection],
        write_conn: &NamedConnection,
        timestamp: DateTime<Utc>,
    ) -> ChirpOutcome;
}
