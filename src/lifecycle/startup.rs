//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the outbound clients from configuration
//! - Register the notifications OAuth client
//! - Assemble the alerter chain in a fixed order
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The status API starts last, after the chirps table exists

use std::sync::Arc;

use thiserror::Error;

use crate::alert::{AggregateAlerter, Alerter, EmailingAlerter, LoggingAlerter, SwitchboardAlerter};
use crate::config::CanaryConfig;
use crate::database::DatabaseError;
use crate::notifications::{
    NotificationError, NotificationsClient, OauthClient, Registration, UaaClient,
};
use crate::switchboard::{SwitchboardClient, SwitchboardError};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create switchboard client: {0}")]
    Switchboard(#[from] SwitchboardError),

    #[error("notifications setup failed: {0}")]
    Notification(#[from] NotificationError),

    #[error("database setup failed: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StartupResult<T> = Result<T, StartupError>;

/// `https://` URL for a bare domain; URLs with a scheme pass through.
pub fn https_url(domain: &str) -> String {
    if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}

/// One client per configured switchboard URL, in order.
pub fn build_switchboard_clients(config: &CanaryConfig) -> StartupResult<Vec<Arc<SwitchboardClient>>> {
    config
        .switchboard
        .urls
        .iter()
        .map(|url| {
            SwitchboardClient::new(
                url,
                &config.switchboard.username,
                &config.switchboard.password,
                config.skip_ssl_validation,
            )
            .map(Arc::new)
            .map_err(StartupError::from)
        })
        .collect()
}

/// Register the canary's notification client using the admin credentials.
pub async fn register_notifications_client(config: &CanaryConfig) -> StartupResult<Registration> {
    let n = &config.notifications;
    let admin = UaaClient::new(
        &https_url(&n.uaa_domain),
        &n.admin_client_username,
        &n.admin_client_secret,
        config.skip_ssl_validation,
    )?;

    let registration = admin
        .register_oauth_client(&OauthClient::mysql_monitoring(&n.client_username, &n.client_secret))
        .await?;

    match registration {
        Registration::Created => tracing::info!(client_id = %n.client_username, "Registered notifications client"),
        Registration::AlreadyExists => {
            tracing::info!(client_id = %n.client_username, "Notifications client already registered")
        }
    }
    Ok(registration)
}

/// Logging first, then email, then one switchboard alerter per proxy.
pub fn build_alerter(
    config: &CanaryConfig,
    switchboards: &[Arc<SwitchboardClient>],
) -> StartupResult<AggregateAlerter> {
    let n = &config.notifications;
    let tokens = UaaClient::new(
        &https_url(&n.uaa_domain),
        &n.client_username,
        &n.client_secret,
        config.skip_ssl_validation,
    )?;
    let notifier = NotificationsClient::new(&https_url(&n.notifications_domain), config.skip_ssl_validation)?;

    let mut alerters: Vec<Arc<dyn Alerter>> = vec![
        Arc::new(LoggingAlerter),
        Arc::new(EmailingAlerter::new(
            Arc::new(tokens),
            Arc::new(notifier),
            n.to_address.clone(),
            n.system_domain.clone(),
            n.cluster_identifier.clone(),
        )),
    ];
    for client in switchboards {
        alerters.push(Arc::new(SwitchboardAlerter::new(client.clone(), config.notify_only)));
    }

    Ok(AggregateAlerter::new(alerters))
}
