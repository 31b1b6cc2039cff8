//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Node sync check (galera.rs):
//!     Canary asks about one node
//!     → SHOW STATUS LIKE 'wsrep_local_state'
//!     → healthy only when Synced
//!
//! State machine (state.rs):
//!     NotUnhealthy ←→ Unhealthy
//!     Edge-triggered to prevent repeated alerts
//! ```
//!
//! # Design Decisions
//! - Node health gates whether a node takes part in verification
//! - Cluster health is two-valued; indeterminate cycles never create a third state

pub mod galera;
pub mod state;

pub use galera::{GaleraHealthchecker, Healthchecker, WsrepState};
pub use state::{HealthState, StateHandle, StatefulStateMachine, Transition};
