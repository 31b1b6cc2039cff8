//! Alerting on cluster health transitions.
//!
//! # Data Flow
//! ```text
//! Coal miner (on a fired transition)
//!     → AggregateAlerter
//!         → LoggingAlerter     (always)
//!         → EmailingAlerter    (unhealthy only)
//!         → SwitchboardAlerter (one per proxy; disable/enable traffic)
//! ```
//!
//! # Design Decisions
//! - Every member runs even when an earlier one fails
//! - Failures are collected into one error; the caller only logs it

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::notifications::NotificationError;
use crate::switchboard::SwitchboardError;

pub mod aggregate;
pub mod email;
pub mod logging;
pub mod switchboard;

pub use aggregate::{AggregateAlerter, AlertErrors};
pub use email::EmailingAlerter;
pub use logging::LoggingAlerter;
pub use switchboard::SwitchboardAlerter;

/// Errors raised while delivering an alert.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error(transparent)]
    Switchboard(#[from] SwitchboardError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error(transparent)]
    Aggregate(#[from] AlertErrors),
}

/// Result type for alert delivery.
pub type AlertResult<T> = Result<T, AlertError>;

/// Reacts to cluster health transitions.
#[async_trait]
pub trait Alerter: Send + Sync {
    async fn unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()>;

    async fn not_unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()>;
}
