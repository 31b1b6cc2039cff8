//! Galera replication canary library

pub mod alert;
pub mod api;
pub mod canary;
pub mod config;
pub mod database;
pub mod health;
pub mod lifecycle;
pub mod notifications;
pub mod observability;
pub mod switchboard;

pub use canary::{Canary, CoalMiner};
pub use config::CanaryConfig;
pub use lifecycle::Shutdown;
