//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Honour `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Human-readable fmt layer on stdout

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directive when neither `RUST_LOG` nor config set a level.
pub const DEFAULT_LEVEL: &str = "info";

/// Filter directive derived from the configured level.
pub fn directive(level: &str) -> String {
    let level = if level.trim().is_empty() {
        DEFAULT_LEVEL
    } else {
        level.trim()
    };
    format!("replication_canary={},tower_http={}", level, level)
}

/// Install the global subscriber.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| directive(level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
