//! Connection factory.
//!
//! # Responsibilities
//! - Build one named connection per configured cluster node, once
//! - Ask the switchboards which backend currently accepts writes
//! - Map that host onto the matching named connection

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::CanaryConfig;
use crate::database::{DatabaseError, DatabaseResult, NamedConnection};
use crate::switchboard::ActiveBackendSource;

/// Source of cluster connections for one chirp cycle.
#[async_trait]
pub trait ConnectionSource: Send + Sync {
    /// Every configured node, in configured order.
    async fn conns(&mut self) -> DatabaseResult<Vec<NamedConnection>>;

    /// The node the switchboards currently route writes to.
    async fn write_conn(&mut self) -> DatabaseResult<NamedConnection>;
}

/// Opens a named connection for `host:port`.
pub type Opener = Box<dyn Fn(&str, u16) -> DatabaseResult<NamedConnection> + Send + Sync>;

/// Connection factory over the configured cluster.
pub struct ConnectionFactory {
    backend_sources: Vec<Arc<dyn ActiveBackendSource>>,
    cluster_ips: Vec<String>,
    port: u16,
    /// Filled by the first successful build, kept for the process lifetime.
    conns: Option<Vec<NamedConnection>>,
    opener: Opener,
}

impl ConnectionFactory {
    pub fn new(
        cluster_ips: Vec<String>,
        port: u16,
        backend_sources: Vec<Arc<dyn ActiveBackendSource>>,
        opener: Opener,
    ) -> Self {
        Self {
            backend_sources,
            cluster_ips,
            port,
            conns: None,
            opener,
        }
    }

    /// Create a factory that opens real pools with the canary credentials.
    pub fn from_config(config: &CanaryConfig, backend_sources: Vec<Arc<dyn ActiveBackendSource>>) -> Self {
        let credentials = config.canary.clone();
        let opener: Opener = Box::new(move |host, port| {
            Ok(NamedConnection::open(
                host,
                port,
                &credentials.database,
                &credentials.username,
                &credentials.password,
            ))
        });

        Self::new(
            config.mysql.cluster_ips.clone(),
            config.mysql.port,
            backend_sources,
            opener,
        )
    }

    /// Open every node or none of them.
    async fn build(&self) -> DatabaseResult<Vec<NamedConnection>> {
        let mut opened = Vec::with_capacity(self.cluster_ips.len());
        let mut first_err = None;

        for ip in &self.cluster_ips {
            match (self.opener)(ip, self.port) {
                Ok(conn) => opened.push(conn),
                Err(e) => {
                    tracing::warn!(host = %ip, port = self.port, error = %e, "Failed to open connection");
                    first_err.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_err {
            for conn in opened {
                conn.close().await;
            }
            return Err(e);
        }

        Ok(opened)
    }

    /// Ask each switchboard in order; the first non-empty host wins.
    async fn active_backend_host(&self) -> DatabaseResult<String> {
        let mut last_err = None;

        for (i, source) in self.backend_sources.iter().enumerate() {
            match source.active_backend_host().await {
                Ok(host) if !host.is_empty() => return Ok(host),
                Ok(_) => {
                    tracing::debug!(switchboard_idx = i, "Switchboard reported no active host");
                }
                Err(e) => {
                    tracing::warn!(switchboard_idx = i, error = %e, "Switchboard lookup failed, trying next");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.map(DatabaseError::from).unwrap_or(DatabaseError::NoActiveHost))
    }
}

#[async_trait]
impl ConnectionSource for ConnectionFactory {
    async fn conns(&mut self) -> DatabaseResult<Vec<NamedConnection>> {
        if let Some(conns) = &self.conns {
            return Ok(conns.clone());
        }

        let conns = self.build().await?;
        self.conns = Some(conns.clone());
        Ok(conns)
    }

    async fn write_conn(&mut self) -> DatabaseResult<NamedConnection> {
        let conns = self.conns().await?;
        let host = self.active_backend_host().await?;

        tracing::info!(host = %host, "Using write connection");

        let prefix = format!("{}:", host);
        conns
            .into_iter()
            .find(|conn| conn.name.starts_with(&prefix))
            .ok_or(DatabaseError::NoConnectionForHost(host))
    }
}
