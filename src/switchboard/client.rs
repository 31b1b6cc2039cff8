//! HTTP client for one switchboard instance.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::Deserialize;
use url::Url;

use crate::switchboard::{ActiveBackendSource, SwitchboardError, SwitchboardResult, TrafficController};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Entry of the `/v0/backends` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    pub host: String,
    pub active: bool,
}

/// Basic-auth client for a switchboard's control API.
#[derive(Clone)]
pub struct SwitchboardClient {
    client: Client,
    root_url: Url,
    username: String,
    password: String,
}

impl SwitchboardClient {
    pub fn new(
        root_url: &str,
        username: &str,
        password: &str,
        skip_ssl_cert_verify: bool,
    ) -> SwitchboardResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(skip_ssl_cert_verify)
            .build()?;

        Ok(Self {
            client,
            root_url: Url::parse(root_url)?,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn root_url(&self) -> &Url {
        &self.root_url
    }

    fn endpoint(&self, path: &str) -> SwitchboardResult<Url> {
        let base = self.root_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    /// List backends as the proxy reports them.
    pub async fn backends(&self) -> SwitchboardResult<Vec<Backend>> {
        let url = self.endpoint("/v0/backends")?;

        tracing::debug!(method = "GET", url = %url, "Making request to proxy");

        // The proxy redirects plain-http requests carrying credentials unless
        // they appear to come through the router.
        let res = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .header("X-Forwarded-Proto", "https")
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Error making request to proxy");
                e
            })?;

        let status = res.status();
        let body = res.text().await?;

        if status.as_u16() >= 400 {
            tracing::debug!(status_code = status.as_u16(), "Received bad status code from proxy");
            return Err(SwitchboardError::BadResponse {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::debug!(error = %e, "Error unmarshalling proxy response body");
            SwitchboardError::BadResponse {
                status: status.as_u16(),
                body: format!("invalid backends listing: {}", e),
            }
        })
    }

    async fn send_cluster_traffic_request(&self, enabled: bool, message: &str) -> SwitchboardResult<()> {
        let mut url = self.endpoint("/v0/cluster")?;
        url.query_pairs_mut()
            .append_pair("trafficEnabled", if enabled { "true" } else { "false" })
            .append_pair("message", message);

        tracing::debug!(
            method = "PATCH",
            url = %url,
            traffic_enabled = enabled,
            message = %message,
            "Making request to proxy"
        );

        let res = self
            .client
            .request(Method::PATCH, url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Error making request to proxy");
                e
            })?;

        check_traffic_response(res, enabled).await
    }
}

async fn check_traffic_response(res: Response, enabled: bool) -> SwitchboardResult<()> {
    let status = res.status();
    if status.as_u16() < 400 {
        return Ok(());
    }

    tracing::debug!(status_code = status.as_u16(), "Received bad status code from proxy");
    let action = if enabled {
        "enabling cluster"
    } else {
        "disabling cluster"
    };
    let body = res.text().await.unwrap_or_default();

    Err(SwitchboardError::TrafficRejected {
        action,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ActiveBackendSource for SwitchboardClient {
    async fn active_backend_host(&self) -> SwitchboardResult<String> {
        self.backends()
            .await?
            .into_iter()
            .find(|backend| backend.active)
            .map(|backend| backend.host)
            .ok_or(SwitchboardError::NoActiveBackend)
    }
}

#[async_trait]
impl TrafficController for SwitchboardClient {
    async fn enable_cluster_traffic(&self) -> SwitchboardResult<()> {
        self.send_cluster_traffic_request(true, "Enabling cluster traffic").await
    }

    async fn disable_cluster_traffic(&self) -> SwitchboardResult<()> {
        self.send_cluster_traffic_request(false, "Disabling cluster traffic").await
    }
}

impl std::fmt::Debug for SwitchboardClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchboardClient")
            .field("root_url", &self.root_url.as_str())
            .field("username", &self.username)
            .finish()
    }
}
