//! Listener setup for the status API.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::TlsConfig;

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a rustls config from the inline PEM certificate and key.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, std::io::Error> {
    if tls.certificate.trim().is_empty() || tls.private_key.trim().is_empty() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "TLS certificate and private key must both be set",
        ));
    }

    RustlsConfig::from_pem(
        tls.certificate.clone().into_bytes(),
        tls.private_key.clone().into_bytes(),
    )
    .await
}

/// Bind the status API listener.
///
/// Called from `main` before the server task is spawned; errors are startup errors.
pub fn bind(addr: SocketAddr) -> Result<std::net::TcpListener, std::io::Error> {
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

/// Serve `router` on a bound `listener` until shutdown is broadcast.
pub async fn serve(
    router: Router,
    listener: std::net::TcpListener,
    tls: Option<RustlsConfig>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;

    match tls {
        Some(config) => {
            let handle = Handle::new();
            let signal = handle.clone();
            tokio::spawn(async move {
                let _ = shutdown.recv().await;
                signal.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
            });

            tracing::info!(address = %addr, "Status API listening (TLS)");
            axum_server::from_tcp_rustls(listener, config)
                .handle(handle)
                .serve(router.into_make_service())
                .await
        }
        None => {
            let listener = TcpListener::from_std(listener)?;
            tracing::info!(address = %addr, "Status API listening");
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await
        }
    }
}
