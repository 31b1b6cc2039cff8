//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build clients → Register notifications client
//!     → Setup chirps table → Start status API → Start coal miner
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Coal miner exits → Status API drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then clients, then listeners
//! - A cycle in progress finishes before the coal miner observes shutdown

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
