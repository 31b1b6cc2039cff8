//! A cluster node paired with its connection pool.

use mysql_async::{OptsBuilder, Pool};

/// One cluster node: a `host:port` name and a lazily-connecting pool.
///
/// Cloning shares the underlying pool.
#[derive(Clone)]
pub struct NamedConnection {
    pub name: String,
    pub pool: Pool,
}

impl NamedConnection {
    pub fn new(name: impl Into<String>, pool: Pool) -> Self {
        Self {
            name: name.into(),
            pool,
        }
    }

    /// Build an unconnected pool for `host:port` with the canary credentials.
    ///
    /// No network traffic happens until a query is issued.
    pub fn open(host: &str, port: u16, database: &str, username: &str, password: &str) -> Self {
        let opts = OptsBuilder::default()
            .ip_or_hostname(host)
            .tcp_port(port)
            .prefer_socket(false)
            .db_name(Some(database))
            .user(Some(username))
            .pass(Some(password));

        Self::new(format!("{}:{}", host, port), Pool::new(opts))
    }

    /// Disconnect every pooled connection.
    pub async fn close(self) {
        if let Err(e) = self.pool.disconnect().await {
            tracing::debug!(node = %self.name, error = %e, "Error closing connection pool");
        }
    }
}

impl std::fmt::Debug for NamedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedConnection")
            .field("name", &self.name)
            .finish()
    }
}
