//! Galera replication canary
//!
//! Periodically writes a marker row through the active write node and reads
//! it back from every synced node. A missing marker disables cluster traffic
//! on every switchboard and emails the operators.
//!
//! # Architecture Overview
//!
//! ```text
//!     ┌──────────────────────────────────────────────────────────────┐
//!     │                    REPLICATION CANARY                         │
//!     │                                                               │
//!     │  ┌────────────┐   ┌──────────┐   ┌────────────────────────┐  │
//!     │  │ coal miner │──▶│  canary  │──▶│ database (pools/store) │──┼──▶ Galera nodes
//!     │  │  (ticker)  │   │  chirp   │   │ + galera healthcheck   │  │
//!     │  └─────┬──────┘   └──────────┘   └───────────┬────────────┘  │
//!     │        │                                     │ write node    │
//!     │        ▼                                     ▼               │
//!     │  ┌────────────┐   ┌──────────────────────────────────────┐   │
//!     │  │   state    │──▶│ alert: logging, email, switchboard   │───┼──▶ UAA / notifications
//!     │  │  machine   │   └──────────────────────────────────────┘   │      / switchboards
//!     │  └─────┬──────┘                                              │
//!     │        ▼                                                     │
//!     │  ┌────────────┐                                              │
//!     │  │ status API │◀─────────────────────────────────────────────┼─── GET /api/v1/status
//!     │  └────────────┘                                              │
//!     └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use replication_canary::api::{self, BasicCredentials};
use replication_canary::canary::{Canary, CoalMiner};
use replication_canary::config::load_config;
use replication_canary::database::{ConnectionFactory, ConnectionSource, MySqlChirpStore};
use replication_canary::health::GaleraHealthchecker;
use replication_canary::lifecycle::{signals, startup, Shutdown};
use replication_canary::observability;
use replication_canary::switchboard::ActiveBackendSource;

#[derive(Parser, Debug)]
#[command(name = "replication-canary", version, about = "Galera replication canary")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", args.config.display(), e);
            std::process::exit(1);
        }
    };

    observability::logging::init_logging(&config.log_level);

    tracing::info!(
        "replication-canary v{} starting",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(config = ?config.sanitized(), "Configuration loaded");

    let switchboards = startup::build_switchboard_clients(&config)?;

    if let Err(e) = startup::register_notifications_client(&config).await {
        tracing::error!(error = %e, "Failed to register notifications client");
        return Err(e.into());
    }

    let alerter = startup::build_alerter(&config, &switchboards)?;

    let backend_sources: Vec<Arc<dyn ActiveBackendSource>> = switchboards
        .iter()
        .map(|client| client.clone() as Arc<dyn ActiveBackendSource>)
        .collect();
    let mut factory = ConnectionFactory::from_config(&config, backend_sources);

    let store = Arc::new(MySqlChirpStore::new(config.effective_session_variables()));
    let canary = Arc::new(Canary::new(
        store,
        Arc::new(GaleraHealthchecker),
        config.write_read_delay(),
    ));

    let write_conn = match factory.write_conn().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve write connection at startup");
            return Err(e.into());
        }
    };
    if let Err(e) = canary.setup(&write_conn).await {
        tracing::error!(node = %write_conn.name, error = %e, "Failed to set up chirps table");
        return Err(e.into());
    }

    if config.metrics.enabled {
        observability::metrics::init_metrics(config.metrics.address.parse()?);
    }

    let shutdown = Shutdown::new();
    let miner = CoalMiner::new(Box::new(factory), canary, Arc::new(alerter));

    let router = api::status_router(
        miner.state_handle(),
        BasicCredentials::new(config.canary.username.clone(), config.canary.password.clone()),
    );
    let api_addr = config.api_address().parse()?;
    let tls = if config.tls.enabled {
        Some(api::load_tls_config(&config.tls).await?)
    } else {
        None
    };
    let listener = match api::bind(api_addr) {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %api_addr, error = %e, "Failed to bind status API");
            return Err(e.into());
        }
    };
    let mut api_task = tokio::spawn(api::serve(router, listener, tls, shutdown.subscribe()));

    tracing::info!("ready to sing");

    let miner_task = tokio::spawn(miner.run(config.poll_frequency(), shutdown.subscribe()));

    // The status API only returns early on failure; that ends the process too.
    let api_result = tokio::select! {
        _ = signals::wait_for_termination() => {
            tracing::info!("Shutdown signal received, stopping");
            shutdown.trigger();
            (&mut api_task).await
        }
        result = &mut api_task => {
            tracing::error!("Status API stopped unexpectedly, stopping");
            shutdown.trigger();
            result
        }
    };

    if let Err(e) = miner_task.await {
        tracing::error!(error = %e, "Coal miner task failed");
    }
    match api_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Status API exited with error");
            return Err(e.into());
        }
        Err(e) => {
            tracing::error!(error = %e, "Status API task failed");
            return Err(e.into());
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
