//! Database access subsystem.
//!
//! # Data Flow
//! ```text
//! Coal miner tick
//!     → factory.rs (build/cached pools per node, resolve write node via switchboard)
//!     → connection.rs (NamedConnection handed to the canary)
//!     → store.rs (chirps table: setup, write, check, cleanup)
//! ```
//!
//! # Design Decisions
//! - One lazily-connecting pool per cluster node, built once per process
//! - Pool construction is all-or-nothing: a partial build is disconnected
//! - Verification reads run in a rolled-back transaction so session
//!   variables and the read share one physical connection

use thiserror::Error;

use crate::switchboard::SwitchboardError;

pub mod connection;
pub mod factory;
pub mod store;

pub use connection::NamedConnection;
pub use factory::{ConnectionFactory, ConnectionSource};
pub use store::{ChirpStore, MySqlChirpStore, MAX_CHIRPS};

/// Errors raised while talking to cluster nodes.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Driver, network or SQL failure.
    #[error(transparent)]
    MySql(#[from] mysql_async::Error),

    /// The node does not expose galera status at all.
    #[error("wsrep_local_state variable not set (possibly not a galera db)")]
    NotGalera,

    /// A node pool could not be created.
    #[error("failed to open connection to {addr}: {reason}")]
    Open { addr: String, reason: String },

    /// No switchboard reported an active backend.
    #[error("no active backend host reported by any switchboard")]
    NoActiveHost,

    /// The active backend is not one of the configured nodes.
    #[error("no connection found for active write host")]
    NoConnectionForHost(String),

    /// Every switchboard lookup failed.
    #[error(transparent)]
    Switchboard(#[from] SwitchboardError),
}

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DatabaseError::NotGalera.to_string(),
            "wsrep_local_state variable not set (possibly not a galera db)"
        );
        assert_eq!(
            DatabaseError::NoConnectionForHost("10.0.0.9".into()).to_string(),
            "no connection found for active write host"
        );
    }
}
