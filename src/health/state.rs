//! Cluster health state machine.
//!
//! # States
//! - NotUnhealthy: initial; replication verified or undeterminable
//! - Unhealthy: a chirp was deterministically missing on a synced node
//!
//! # State Transitions
//! ```text
//! NotUnhealthy → Unhealthy: becomes_unhealthy (fires)
//! Unhealthy → NotUnhealthy: becomes_not_unhealthy (fires)
//! Same-state calls set the state again without firing
//! remains_in_same_state: no change, no firing
//! ```
//!
//! # Design Decisions
//! - Transitions are pure functions over the state value
//! - Callers run alerting when a transition fires; this type has no callbacks
//! - State lives in an atomic so the status API can read it from its own task

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthState {
    #[default]
    NotUnhealthy = 0,
    Unhealthy = 1,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Unhealthy,
            _ => HealthState::NotUnhealthy,
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::NotUnhealthy => write!(f, "NotUnhealthy"),
            HealthState::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

/// Result of applying one observation to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: HealthState,
    /// True when the state actually changed.
    pub fires: bool,
}

impl HealthState {
    pub fn becomes_unhealthy(self) -> Transition {
        Transition {
            state: HealthState::Unhealthy,
            fires: self == HealthState::NotUnhealthy,
        }
    }

    pub fn becomes_not_unhealthy(self) -> Transition {
        Transition {
            state: HealthState::NotUnhealthy,
            fires: self == HealthState::Unhealthy,
        }
    }
}

/// Read-only view of the current state for other tasks.
#[derive(Debug, Clone)]
pub struct StateHandle {
    state: Arc<AtomicU8>,
}

impl StateHandle {
    pub fn state(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Acquire))
    }

    pub fn is_healthy(&self) -> bool {
        self.state() == HealthState::NotUnhealthy
    }
}

/// Edge-triggered two-state machine driven by the coal miner.
#[derive(Debug, Default)]
pub struct StatefulStateMachine {
    state: Arc<AtomicU8>,
}

impl StatefulStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Acquire))
    }

    pub fn handle(&self) -> StateHandle {
        StateHandle {
            state: self.state.clone(),
        }
    }

    fn apply(&self, transition: Transition) -> bool {
        self.state.store(transition.state as u8, Ordering::Release);
        transition.fires
    }

    /// Record a deterministic replication failure. Returns true on the edge.
    pub fn becomes_unhealthy(&self, timestamp: DateTime<Utc>) -> bool {
        let transition = self.state().becomes_unhealthy();
        if transition.fires {
            tracing::debug!(timestamp = %timestamp, "StateMachine transitioning to unhealthy");
        }
        tracing::debug!(timestamp = %timestamp, "StateMachine unhealthy");
        self.apply(transition)
    }

    /// Record success or an indeterminate outcome. Returns true on the edge.
    pub fn becomes_not_unhealthy(&self, timestamp: DateTime<Utc>) -> bool {
        let transition = self.state().becomes_not_unhealthy();
        if transition.fires {
            tracing::debug!(timestamp = %timestamp, "StateMachine transitioning to not unhealthy");
        }
        tracing::debug!(timestamp = %timestamp, "StateMachine not unhealthy");
        self.apply(transition)
    }

    /// Nothing could be observed this cycle.
    pub fn remains_in_same_state(&self, timestamp: DateTime<Utc>) {
        tracing::debug!(
            timestamp = %timestamp,
            state = %self.state(),
            "StateMachine remaining in the same state"
        );
    }
}
