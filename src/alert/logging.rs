//! Alerter that only writes to the log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::alert::{AlertResult, Alerter};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingAlerter;

#[async_trait]
impl Alerter for LoggingAlerter {
    async fn unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()> {
        tracing::error!(timestamp = %timestamp, "cluster is unhealthy");
        Ok(())
    }

    async fn not_unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()> {
        tracing::info!(timestamp = %timestamp, "cluster is not unhealthy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_never_fails() {
        let alerter = LoggingAlerter;
        assert!(alerter.unhealthy(Utc::now()).await.is_ok());
        assert!(alerter.not_unhealthy(Utc::now()).await.is_ok());
    }
}
