//! Notifications service email client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;

use crate::notifications::{NotificationError, NotificationResult, Notifier};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct EmailRequestBody<'a> {
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    kind_id: &'a str,
}

/// Client for `POST /emails`.
#[derive(Debug, Clone)]
pub struct NotificationsClient {
    client: Client,
    base_url: String,
}

impl NotificationsClient {
    pub fn new(base_url: &str, skip_ssl_cert_verify: bool) -> NotificationResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(skip_ssl_cert_verify)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Notifier for NotificationsClient {
    async fn email(
        &self,
        token: &str,
        to: &str,
        subject: &str,
        html: &str,
        kind_id: &str,
    ) -> NotificationResult<()> {
        let body = serde_json::to_vec(&EmailRequestBody {
            to,
            subject,
            html,
            kind_id,
        })?;

        let url = format!("{}/emails", self.base_url);
        tracing::debug!(method = "POST", url = %url, "Making request to notifications");

        // The service expects this content type even though the body is JSON.
        let res = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("X-NOTIFICATIONS-VERSION", "1")
            .bearer_auth(token)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Error making request to notifications");
                e
            })?;

        let status = res.status();
        if status.as_u16() >= 400 {
            tracing::debug!(status_code = status.as_u16(), "Received bad status code from notifications");
            let body = res.text().await.unwrap_or_default();
            return Err(NotificationError::BadResponse {
                action: "sending email",
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
