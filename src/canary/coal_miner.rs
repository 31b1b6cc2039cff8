//! Periodic control loop driving the canary.
//!
//! # Responsibilities
//! - Resolve connections once per tick
//! - Run one chirp and feed its outcome to the state machine
//! - Fan out alerts when the state changes
//!
//! # Design Decisions
//! - Ticks missed while a cycle runs are delayed, never bursted
//! - The state is stored before alerting, so the status API may report the
//!   new state while alerts are still in flight
//! - Alert failures are logged and counted, never propagated

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::alert::Alerter;
use crate::canary::{ChirpOutcome, Chirper};
use crate::database::ConnectionSource;
use crate::health::{StateHandle, StatefulStateMachine};
use crate::observability::metrics;

pub struct CoalMiner {
    conns: Box<dyn ConnectionSource>,
    chirper: Arc<dyn Chirper>,
    alerter: Arc<dyn Alerter>,
    machine: StatefulStateMachine,
}

impl CoalMiner {
    pub fn new(
        conns: Box<dyn ConnectionSource>,
        chirper: Arc<dyn Chirper>,
        alerter: Arc<dyn Alerter>,
    ) -> Self {
        Self {
            conns,
            chirper,
            alerter,
            machine: StatefulStateMachine::new(),
        }
    }

    /// Read-only state view for the status API.
    pub fn state_handle(&self) -> StateHandle {
        self.machine.handle()
    }

    /// Run one chirp cycle stamped with `at`.
    pub async fn tick(&mut self, at: DateTime<Utc>) {
        let write_conn = match self.conns.write_conn().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(timestamp = %at, error = %e, "Failed to resolve write connection");
                self.machine.remains_in_same_state(at);
                return;
            }
        };

        let conns = match self.conns.conns().await {
            Ok(conns) => conns,
            Err(e) => {
                tracing::error!(timestamp = %at, error = %e, "Failed to open cluster connections");
                self.machine.remains_in_same_state(at);
                return;
            }
        };

        let outcome = self.chirper.chirp(&conns, &write_conn, at).await;
        metrics::record_chirp(&outcome);
        self.parse_replication_health(outcome, at).await;
    }

    /// Apply one outcome to the state machine and alert on an edge.
    pub async fn parse_replication_health(&self, outcome: ChirpOutcome, at: DateTime<Utc>) {
        match outcome {
            ChirpOutcome::ReplicationFailure => {
                if self.machine.becomes_unhealthy(at) {
                    metrics::record_state(self.machine.state());
                    if let Err(e) = self.alerter.unhealthy(at).await {
                        tracing::error!(timestamp = %at, error = %e, "Failed to alert unhealthy cluster");
                        metrics::record_alert_failure("unhealthy");
                    }
                }
            }
            ChirpOutcome::Healthy => self.recover(at).await,
            ChirpOutcome::Indeterminate(e) => {
                tracing::error!(timestamp = %at, error = %e, "Chirp could not determine replication health");
                self.recover(at).await;
            }
        }
    }

    async fn recover(&self, at: DateTime<Utc>) {
        if self.machine.becomes_not_unhealthy(at) {
            metrics::record_state(self.machine.state());
            if let Err(e) = self.alerter.not_unhealthy(at).await {
                tracing::error!(timestamp = %at, error = %e, "Failed to alert cluster recovery");
                metrics::record_alert_failure("not_unhealthy");
            }
        }
    }

    /// Tick every `period` until shutdown. The first cycle runs after one period.
    pub async fn run(mut self, period: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(poll_frequency_secs = period.as_secs(), "Coal miner starting");
        metrics::record_state(self.machine.state());

        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(Utc::now()).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Coal miner received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
