//! Chirps table persistence.
//!
//! # Responsibilities
//! - Create the `chirps` table
//! - Insert one marker per chirp cycle on the write node
//! - Read a marker back under forced-consistency session variables
//! - Keep the table bounded to the retention window
//!
//! # Design Decisions
//! - Markers are RFC 3339 timestamps with nanosecond precision
//! - A missing row is a valid answer (`Ok(false)`), never an error
//! - Reads are always rolled back; cleanup commits only when every step succeeds

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use mysql_async::prelude::Queryable;
use mysql_async::{Transaction, TxOpts};

use crate::database::{DatabaseResult, NamedConnection};

/// Markers retained by cleanup: three days of one chirp per minute.
pub const MAX_CHIRPS: u64 = 24 * 60 * 3;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS chirps (id INT NOT NULL AUTO_INCREMENT PRIMARY KEY, data VARCHAR(255) NOT NULL) ENGINE=InnoDB";

/// Storage operations the canary performs against a node.
#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn setup(&self, conn: &NamedConnection) -> DatabaseResult<()>;

    async fn write(&self, conn: &NamedConnection, timestamp: DateTime<Utc>) -> DatabaseResult<()>;

    /// `Ok(true)` when the marker for `timestamp` is visible on `conn`,
    /// `Ok(false)` when it is not, `Err` when visibility could not be determined.
    async fn check(&self, conn: &NamedConnection, timestamp: DateTime<Utc>) -> DatabaseResult<bool>;

    async fn cleanup(&self, conn: &NamedConnection) -> DatabaseResult<()>;
}

/// String form of a timestamp as stored in `chirps.data`.
pub fn marker(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Rows cleanup must delete for a table holding `row_count` markers.
pub fn rows_to_delete(row_count: u64) -> Option<u64> {
    row_count.checked_sub(MAX_CHIRPS).filter(|excess| *excess > 0)
}

/// [`ChirpStore`] backed by MySQL.
#[derive(Debug, Clone, Default)]
pub struct MySqlChirpStore {
    session_variables: BTreeMap<String, String>,
}

impl MySqlChirpStore {
    pub fn new(session_variables: BTreeMap<String, String>) -> Self {
        Self { session_variables }
    }

    async fn read_marker(&self, tx: &mut Transaction<'_>, marker: &str) -> DatabaseResult<bool> {
        for (name, value) in &self.session_variables {
            if let Err(e) = tx.query_drop(format!("SET SESSION {}={}", name, value)).await {
                tracing::debug!(
                    error = %e,
                    session_variable_name = %name,
                    session_variable_value = %value,
                    "Error setting session variable"
                );
                return Err(e.into());
            }
        }

        let data: Option<String> = tx
            .exec_first(
                "SELECT data FROM chirps WHERE data = ? ORDER BY id DESC LIMIT 1",
                (marker,),
            )
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Error selecting data");
                e
            })?;

        Ok(data.as_deref() == Some(marker))
    }

    async fn prune(tx: &mut Transaction<'_>) -> DatabaseResult<()> {
        let row_count: Option<u64> = tx
            .query_first("SELECT COUNT(id) AS row_count FROM chirps")
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Error counting rows");
                e
            })?;

        let Some(excess) = rows_to_delete(row_count.unwrap_or(0)) else {
            return Ok(());
        };

        tracing::debug!(count = excess, "Deleting rows");
        tx.exec_drop("DELETE FROM chirps ORDER BY id ASC LIMIT ?", (excess,))
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Error deleting rows");
                e
            })?;

        Ok(())
    }
}

#[async_trait]
impl ChirpStore for MySqlChirpStore {
    async fn setup(&self, conn: &NamedConnection) -> DatabaseResult<()> {
        let mut c = conn.pool.get_conn().await?;
        c.query_drop(CREATE_TABLE).await.map_err(|e| {
            tracing::debug!(node = %conn.name, error = %e, "Error creating table");
            e
        })?;
        Ok(())
    }

    async fn write(&self, conn: &NamedConnection, timestamp: DateTime<Utc>) -> DatabaseResult<()> {
        let mut c = conn.pool.get_conn().await?;
        c.exec_drop("INSERT INTO chirps (data) VALUES (?)", (marker(timestamp),))
            .await
            .map_err(|e| {
                tracing::debug!(node = %conn.name, error = %e, "Error inserting data");
                e
            })?;
        Ok(())
    }

    async fn check(&self, conn: &NamedConnection, timestamp: DateTime<Utc>) -> DatabaseResult<bool> {
        let mut c = conn.pool.get_conn().await?;
        let mut tx = c.start_transaction(TxOpts::default()).await.map_err(|e| {
            tracing::debug!(node = %conn.name, error = %e, "Error creating transaction");
            e
        })?;

        let visible = self.read_marker(&mut tx, &marker(timestamp)).await;

        // Read-only: never commit.
        if let Err(e) = tx.rollback().await {
            tracing::debug!(node = %conn.name, error = %e, "Error rolling back read transaction");
        }

        visible
    }

    async fn cleanup(&self, conn: &NamedConnection) -> DatabaseResult<()> {
        let mut c = conn.pool.get_conn().await?;
        let mut tx = c.start_transaction(TxOpts::default()).await.map_err(|e| {
            tracing::debug!(node = %conn.name, error = %e, "Error beginning transaction");
            e
        })?;

        match Self::prune(&mut tx).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(())
            }
            Err(e) => {
                tracing::debug!(node = %conn.name, error = %e, "Error occurred, rolling back transaction");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::debug!(node = %conn.name, error = %rollback_err, "Error rolling back cleanup transaction");
                }
                Err(e)
            }
        }
    }
}
