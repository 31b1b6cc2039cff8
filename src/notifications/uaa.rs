//! UAA client: client-credentials tokens and OAuth client registration.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::notifications::{NotificationError, NotificationResult, TokenFetcher};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// Token response of `POST /oauth/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
}

/// Body of `POST /oauth/clients`.
#[derive(Debug, Clone, Serialize)]
pub struct OauthClient {
    pub client_id: String,
    pub name: String,
    pub client_secret: String,
    pub scope: Vec<String>,
    pub resource_ids: Vec<String>,
    pub authorities: Vec<String>,
    pub authorized_grant_types: Vec<String>,
    pub access_token_validity: u64,
    pub redirect_uri: Vec<String>,
}

impl OauthClient {
    /// The client the canary uses to send critical notification emails.
    pub fn mysql_monitoring(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            name: "Mysql Monitoring".to_string(),
            client_secret: client_secret.to_string(),
            scope: Vec::new(),
            resource_ids: Vec::new(),
            authorities: vec![
                "notifications.write".to_string(),
                "critical_notifications.write".to_string(),
                "emails.write".to_string(),
            ],
            authorized_grant_types: vec!["client_credentials".to_string()],
            access_token_validity: 3600,
            redirect_uri: Vec::new(),
        }
    }
}

/// Outcome of a client registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    AlreadyExists,
}

struct CachedToken {
    token: AccessToken,
    refresh_at: Instant,
}

/// Client-credentials client for one UAA client id.
pub struct UaaClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl UaaClient {
    pub fn new(
        base_url: &str,
        client_id: &str,
        client_secret: &str,
        skip_ssl_cert_verify: bool,
    ) -> NotificationResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(skip_ssl_cert_verify)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            cached: Mutex::new(None),
        })
    }

    async fn request_token(&self) -> NotificationResult<AccessToken> {
        let url = format!("{}/oauth/token", self.base_url);
        tracing::debug!(url = %url, client_id = %self.client_id, "Requesting UAA token");

        let res = self
            .client
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = res.status();
        if status.as_u16() >= 400 {
            let body = res.text().await.unwrap_or_default();
            return Err(NotificationError::BadResponse {
                action: "fetching token",
                status: status.as_u16(),
                body,
            });
        }

        Ok(res.json().await?)
    }

    /// Register `oauth_client` using this client's (admin) token.
    ///
    /// A client that is already registered is not an error.
    pub async fn register_oauth_client(&self, oauth_client: &OauthClient) -> NotificationResult<Registration> {
        let token = self.fetch_token(false).await?;
        let url = format!("{}/oauth/clients", self.base_url);

        tracing::debug!(url = %url, client_id = %oauth_client.client_id, "Registering UAA client");

        let res = self
            .client
            .post(url)
            .bearer_auth(&token.access_token)
            .json(oauth_client)
            .send()
            .await?;

        match res.status() {
            StatusCode::CONFLICT => Ok(Registration::AlreadyExists),
            status if status.as_u16() >= 400 => {
                let body = res.text().await.unwrap_or_default();
                Err(NotificationError::BadResponse {
                    action: "registering client",
                    status: status.as_u16(),
                    body,
                })
            }
            _ => Ok(Registration::Created),
        }
    }
}

#[async_trait]
impl TokenFetcher for UaaClient {
    async fn fetch_token(&self, force_refresh: bool) -> NotificationResult<AccessToken> {
        let mut cached = self.cached.lock().await;

        if !force_refresh {
            if let Some(entry) = cached.as_ref() {
                if Instant::now() < entry.refresh_at {
                    return Ok(entry.token.clone());
                }
            }
        }

        let token = self.request_token().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            token: token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(token)
    }
}

impl std::fmt::Debug for UaaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UaaClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_monitoring_client() {
        let client = OauthClient::mysql_monitoring("mysql-monitoring", "secret");
        assert_eq!(client.name, "Mysql Monitoring");
        assert_eq!(client.authorized_grant_types, vec!["client_credentials"]);
        assert!(client.authorities.contains(&"emails.write".to_string()));
        assert_eq!(client.access_token_validity, 3600);

        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["client_id"], "mysql-monitoring");
    }

    #[test]
    fn test_token_response_defaults() {
        let token: AccessToken = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, 0);
    }
}
