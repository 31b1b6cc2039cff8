//! Alerter chain built from config against mock UAA, notifications and switchboards.

use chrono::Utc;

use replication_canary::alert::{AlertError, Alerter};
use replication_canary::config::CanaryConfig;
use replication_canary::lifecycle::startup::{
    build_alerter, build_switchboard_clients, register_notifications_client,
};
use replication_canary::notifications::Registration;

mod common;

async fn start_uaa() -> common::MockServer {
    common::start_programmable_server(|req| match req.path.as_str() {
        "/oauth/token" => (200, common::TOKEN_BODY.to_string()),
        "/oauth/clients" => (201, String::new()),
        _ => (404, String::new()),
    })
    .await
}

fn config(uaa: &str, notifications: &str, switchboards: Vec<String>, notify_only: bool) -> CanaryConfig {
    let mut config = CanaryConfig::default();
    config.notify_only = notify_only;
    config.switchboard.urls = switchboards;
    config.switchboard.username = "proxy".into();
    config.switchboard.password = "proxy-secret".into();
    let n = &mut config.notifications;
    n.admin_client_username = "admin".into();
    n.admin_client_secret = "admin-secret".into();
    n.client_username = "mysql-monitoring".into();
    n.client_secret = "client-secret".into();
    n.uaa_domain = uaa.into();
    n.notifications_domain = notifications.into();
    n.to_address = "ops@example.com".into();
    n.system_domain = "sys.example.com".into();
    n.cluster_identifier = "cf-mysql".into();
    config
}

#[tokio::test]
async fn test_unhealthy_emails_and_disables_every_switchboard() {
    let uaa = start_uaa().await;
    let emails = common::start_mock_server(200, "").await;
    let proxy_0 = common::start_mock_server(204, "").await;
    let proxy_1 = common::start_mock_server(204, "").await;
    let config = config(&uaa.url(), &emails.url(), vec![proxy_0.url(), proxy_1.url()], false);

    let clients = build_switchboard_clients(&config).unwrap();
    let alerter = build_alerter(&config, &clients).unwrap();
    alerter.unhealthy(Utc::now()).await.unwrap();

    let sent = emails.requests_to("/emails");
    assert_eq!(sent.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&sent[0].body).unwrap();
    assert_eq!(
        body["subject"],
        "[sys.example.com][cf-mysql] p-mysql Replication Canary, alert 417"
    );
    for proxy in [&proxy_0, &proxy_1] {
        let requests = proxy.requests_to("/v0/cluster");
        assert_eq!(requests.len(), 1);
        assert!(requests[0].query.as_deref().unwrap().starts_with("trafficEnabled=false"));
    }
}

#[tokio::test]
async fn test_recovery_enables_traffic_without_email() {
    let uaa = start_uaa().await;
    let emails = common::start_mock_server(200, "").await;
    let proxy = common::start_mock_server(204, "").await;
    let config = config(&uaa.url(), &emails.url(), vec![proxy.url()], false);

    let clients = build_switchboard_clients(&config).unwrap();
    build_alerter(&config, &clients).unwrap().not_unhealthy(Utc::now()).await.unwrap();

    assert!(emails.requests().is_empty());
    let requests = proxy.requests_to("/v0/cluster");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].query.as_deref().unwrap().starts_with("trafficEnabled=true"));
}

#[tokio::test]
async fn test_notify_only_leaves_traffic_alone() {
    let uaa = start_uaa().await;
    let emails = common::start_mock_server(200, "").await;
    let proxy = common::start_mock_server(204, "").await;
    let config = config(&uaa.url(), &emails.url(), vec![proxy.url()], true);

    let clients = build_switchboard_clients(&config).unwrap();
    build_alerter(&config, &clients).unwrap().unhealthy(Utc::now()).await.unwrap();

    assert_eq!(emails.requests_to("/emails").len(), 1);
    assert!(proxy.requests().is_empty());
}

#[tokio::test]
async fn test_failing_member_does_not_stop_the_others() {
    let uaa = start_uaa().await;
    let emails = common::start_mock_server(500, "mail down").await;
    let proxy = common::start_mock_server(204, "").await;
    let config = config(&uaa.url(), &emails.url(), vec![proxy.url()], false);

    let clients = build_switchboard_clients(&config).unwrap();
    let err = build_alerter(&config, &clients)
        .unwrap()
        .unhealthy(Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, AlertError::Aggregate(_)));
    assert!(err.to_string().contains("mail down"));
    assert_eq!(proxy.requests_to("/v0/cluster").len(), 1);
}

#[tokio::test]
async fn test_register_notifications_client_with_admin_credentials() {
    let uaa = start_uaa().await;
    let config = config(&uaa.url(), "unused", Vec::new(), false);

    let registration = register_notifications_client(&config).await.unwrap();

    assert_eq!(registration, Registration::Created);
    let token_requests = uaa.requests_to("/oauth/token");
    assert_eq!(token_requests.len(), 1);
    // base64("admin:admin-secret")
    assert_eq!(
        token_requests[0].header("authorization"),
        Some("Basic YWRtaW46YWRtaW4tc2VjcmV0")
    );
}
