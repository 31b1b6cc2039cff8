//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Canary, coal miner and alerters produce:
//!     → logging.rs (structured tracing events to stdout)
//!     → metrics.rs (chirp outcomes, health gauge, alert failures)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Metric updates go through the `metrics` facade and are no-ops without an exporter
//! - The exporter is only installed when enabled in config

pub mod logging;
pub mod metrics;
