//! Operator notification subsystem.
//!
//! # Data Flow
//! ```text
//! Emailing alerter
//!     → uaa.rs (client-credentials token, cached until near expiry)
//!     → emailer.rs (POST /emails on the notifications service)
//!
//! Startup
//!     → uaa.rs admin client registers the canary's notification client
//! ```
//!
//! # Design Decisions
//! - Traits at both seams so the alerter is testable without HTTP
//! - Fixed five second timeout per request, no retries

use async_trait::async_trait;
use thiserror::Error;

pub mod emailer;
pub mod uaa;

pub use emailer::NotificationsClient;
pub use uaa::{AccessToken, OauthClient, Registration, UaaClient};

/// Errors raised by the token issuer or notifications service.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Transport-level failure.
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// The service answered with an error status.
    #[error("bad response {action} ({status}) - {body}")]
    BadResponse {
        action: &'static str,
        status: u16,
        body: String,
    },
}

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Issues access tokens for the notifications service.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch_token(&self, force_refresh: bool) -> NotificationResult<AccessToken>;
}

/// Delivers one email.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn email(
        &self,
        token: &str,
        to: &str,
        subject: &str,
        html: &str,
        kind_id: &str,
    ) -> NotificationResult<()>;
}
