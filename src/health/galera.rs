//! Galera node sync check.
//!
//! `wsrep_local_state` reports the node's own position in the galera state
//! machine. Only a `Synced` node is expected to serve consistent reads.

use async_trait::async_trait;
use mysql_async::prelude::Queryable;

use crate::database::{DatabaseError, DatabaseResult, NamedConnection};

/// Answers whether a node's replication engine is fully synchronized.
#[async_trait]
pub trait Healthchecker: Send + Sync {
    async fn healthy(&self, conn: &NamedConnection) -> DatabaseResult<bool>;
}

/// Values of `wsrep_local_state`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WsrepState {
    Invalid = 0,
    Joining = 1,
    DonorDesynced = 2,
    Joined = 3,
    Synced = 4,
}

impl From<i64> for WsrepState {
    fn from(val: i64) -> Self {
        match val {
            1 => WsrepState::Joining,
            2 => WsrepState::DonorDesynced,
            3 => WsrepState::Joined,
            4 => WsrepState::Synced,
            _ => WsrepState::Invalid,
        }
    }
}

impl WsrepState {
    pub fn is_synced(self) -> bool {
        self == WsrepState::Synced
    }
}

/// [`Healthchecker`] that reads `SHOW STATUS LIKE 'wsrep_local_state'`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaleraHealthchecker;

impl GaleraHealthchecker {
    pub async fn local_state(conn: &NamedConnection) -> DatabaseResult<WsrepState> {
        let mut c = conn.pool.get_conn().await?;
        let row: Option<(String, i64)> = c
            .query_first("SHOW STATUS LIKE 'wsrep_local_state'")
            .await
            .map_err(|e| {
                tracing::debug!(node = %conn.name, error = %e, "Error getting 'wsrep_local_state'");
                e
            })?;

        match row {
            Some((_, value)) => Ok(WsrepState::from(value)),
            None => {
                tracing::debug!(node = %conn.name, "No rows found containing 'wsrep_local_state'");
                Err(DatabaseError::NotGalera)
            }
        }
    }
}

#[async_trait]
impl Healthchecker for GaleraHealthchecker {
    async fn healthy(&self, conn: &NamedConnection) -> DatabaseResult<bool> {
        let state = Self::local_state(conn).await?;
        if !state.is_synced() {
            tracing::debug!(node = %conn.name, wsrep_local_state = ?state, "Node is not synced");
        }
        Ok(state.is_synced())
    }
}
