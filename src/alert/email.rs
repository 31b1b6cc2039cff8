//! Alerter that emails operators when the cluster becomes unhealthy.
//!
//! Recovery sends nothing; only the unhealthy edge is worth a page.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::alert::{AlertResult, Alerter};
use crate::notifications::{Notifier, TokenFetcher};

pub const KIND_ID: &str = "p-mysql";

pub const ALERT_HTML: &str = "{alert-code 417}<br/>This is an e-mail to notify you that the MySQL service's replication canary has detected an unsafe cluster condition in which replication is not performing as expected across all nodes.";

pub struct EmailingAlerter {
    tokens: Arc<dyn TokenFetcher>,
    notifier: Arc<dyn Notifier>,
    to_address: String,
    system_domain: String,
    cluster_identifier: String,
}

impl EmailingAlerter {
    pub fn new(
        tokens: Arc<dyn TokenFetcher>,
        notifier: Arc<dyn Notifier>,
        to_address: impl Into<String>,
        system_domain: impl Into<String>,
        cluster_identifier: impl Into<String>,
    ) -> Self {
        Self {
            tokens,
            notifier,
            to_address: to_address.into(),
            system_domain: system_domain.into(),
            cluster_identifier: cluster_identifier.into(),
        }
    }

    pub fn subject(&self) -> String {
        format!(
            "[{}][{}] p-mysql Replication Canary, alert 417",
            self.system_domain, self.cluster_identifier
        )
    }
}

#[async_trait]
impl Alerter for EmailingAlerter {
    async fn unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()> {
        tracing::debug!(timestamp = %timestamp, to = %self.to_address, "Sending unhealthy email");

        let token = self.tokens.fetch_token(true).await?;
        self.notifier
            .email(
                &token.access_token,
                &self.to_address,
                &self.subject(),
                ALERT_HTML,
                KIND_ID,
            )
            .await?;
        Ok(())
    }

    async fn not_unhealthy(&self, _timestamp: DateTime<Utc>) -> AlertResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for EmailingAlerter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailingAlerter")
            .field("to_address", &self.to_address)
            .field("system_domain", &self.system_domain)
            .field("cluster_identifier", &self.cluster_identifier)
            .finish()
    }
}
