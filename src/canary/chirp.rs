//! One canary chirp.
//!
//! # Responsibilities
//! - Gate the cycle on the write node being synced
//! - Write one marker and verify it on every synced node
//! - Keep the chirps table bounded after every verification
//!
//! # Design Decisions
//! - Nodes are visited sequentially in configured order
//! - The write node is verified like every other node
//! - Only the first verification error is surfaced

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::canary::{CanaryError, CanaryResult, ChirpOutcome, Chirper};
use crate::database::{ChirpStore, DatabaseResult, NamedConnection};
use crate::health::Healthchecker;

/// Writes markers and verifies they replicate.
pub struct Canary {
    store: Arc<dyn ChirpStore>,
    healthchecker: Arc<dyn Healthchecker>,
    write_read_delay: Duration,
}

impl Canary {
    pub fn new(
        store: Arc<dyn ChirpStore>,
        healthchecker: Arc<dyn Healthchecker>,
        write_read_delay: Duration,
    ) -> Self {
        Self {
            store,
            healthchecker,
            write_read_delay,
        }
    }

    /// Create the chirps table on the write node.
    pub async fn setup(&self, write_conn: &NamedConnection) -> DatabaseResult<()> {
        self.store.setup(write_conn).await
    }

    /// Insert the marker for `timestamp` on the write node.
    pub async fn write(&self, write_conn: &NamedConnection, timestamp: DateTime<Utc>) -> DatabaseResult<()> {
        tracing::debug!(node = %write_conn.name, timestamp = %timestamp, "Writing chirp");
        self.store.write(write_conn, timestamp).await.map_err(|e| {
            tracing::debug!(node = %write_conn.name, timestamp = %timestamp, error = %e, "Error writing chirp");
            e
        })
    }

    /// Verify the marker on every synced node.
    ///
    /// `Ok(false)` as soon as one synced node answers without the marker;
    /// nodes after it are not queried.
    pub async fn read(&self, conns: &[NamedConnection], timestamp: DateTime<Utc>) -> CanaryResult<bool> {
        let mut first_error: Option<CanaryError> = None;

        for conn in conns {
            match self.healthchecker.healthy(conn).await {
                Err(e) => {
                    tracing::debug!(node = %conn.name, error = %e, "Error checking galera health");
                    first_error.get_or_insert(e.into());
                    continue;
                }
                Ok(false) => {
                    tracing::debug!(node = %conn.name, "Skipping unsynced node");
                    continue;
                }
                Ok(true) => {}
            }

            tracing::debug!(node = %conn.name, timestamp = %timestamp, "Reading chirp");
            match self.store.check(conn, timestamp).await {
                Ok(true) => {
                    tracing::debug!(node = %conn.name, timestamp = %timestamp, "Found chirp");
                }
                Ok(false) => {
                    tracing::debug!(node = %conn.name, timestamp = %timestamp, "Chirp not found");
                    return Ok(false);
                }
                Err(e) => {
                    tracing::debug!(node = %conn.name, timestamp = %timestamp, error = %e, "Error reading chirp");
                    first_error.get_or_insert(e.into());
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    async fn precheck_write_node(&self, write_conn: &NamedConnection) -> CanaryResult<()> {
        match self.healthchecker.healthy(write_conn).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(CanaryError::WriteNodeUnhealthy),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl Chirper for Canary {
    async fn chirp(
        &self,
        all_conns: &[NamedConnection],
        write_conn: &NamedConnection,
        timestamp: DateTime<Utc>,
    ) -> ChirpOutcome {
        if let Err(e) = self.precheck_write_node(write_conn).await {
            tracing::debug!(node = %write_conn.name, error = %e, "Write node failed health check");
            return ChirpOutcome::Indeterminate(e);
        }

        if let Err(e) = self.write(write_conn, timestamp).await {
            return ChirpOutcome::Indeterminate(e.into());
        }

        tokio::time::sleep(self.write_read_delay).await;

        let read_result = self.read(all_conns, timestamp).await;
        let cleanup_result = self.store.cleanup(write_conn).await;
        if let Err(e) = &cleanup_result {
            tracing::debug!(node = %write_conn.name, error = %e, "Error cleaning up chirps");
        }

        match (read_result, cleanup_result) {
            (Err(e), _) => ChirpOutcome::Indeterminate(e),
            (Ok(_), Err(e)) => ChirpOutcome::Indeterminate(e.into()),
            (Ok(true), Ok(())) => ChirpOutcome::Healthy,
            (Ok(false), Ok(())) => ChirpOutcome::ReplicationFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Answer {
        Yes,
        No,
        Fail,
    }

    impl Answer {
        fn into_result(self) -> DatabaseResult<bool> {
            match self {
                Answer::Yes => Ok(true),
                Answer::No => Ok(false),
                Answer::Fail => Err(DatabaseError::NotGalera),
            }
        }
    }

    #[derive(Default)]
    struct FakeHealthchecker {
        answers: HashMap<String, Answer>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Healthchecker for FakeHealthchecker {
        async fn healthy(&self, conn: &NamedConnection) -> DatabaseResult<bool> {
            self.calls.lock().unwrap().push(conn.name.clone());
            self.answers.get(&conn.name).copied().unwrap_or(Answer::Yes).into_result()
        }
    }

    #[derive(Default)]
    struct FakeStore {
        checks: HashMap<String, Answer>,
        fail_write: bool,
        fail_cleanup: bool,
        calls: Mutex<Vec<String>>,
    }

    impl FakeStore {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChirpStore for FakeStore {
        async fn setup(&self, conn: &NamedConnection) -> DatabaseResult<()> {
            self.calls.lock().unwrap().push(format!("setup {}", conn.name));
            Ok(())
        }

        async fn write(&self, conn: &NamedConnection, _timestamp: DateTime<Utc>) -> DatabaseResult<()> {
            self.calls.lock().unwrap().push(format!("write {}", conn.name));
            if self.fail_write {
                return Err(DatabaseError::NoActiveHost);
            }
            Ok(())
        }

        async fn check(&self, conn: &NamedConnection, _timestamp: DateTime<Utc>) -> DatabaseResult<bool> {
            self.calls.lock().unwrap().push(format!("check {}", conn.name));
            self.checks.get(&conn.name).copied().unwrap_or(Answer::Yes).into_result()
        }

        async fn cleanup(&self, conn: &NamedConnection) -> DatabaseResult<()> {
            self.calls.lock().unwrap().push(format!("cleanup {}", conn.name));
            if self.fail_cleanup {
                return Err(DatabaseError::NoActiveHost);
            }
            Ok(())
        }
    }

    fn nodes() -> Vec<NamedConnection> {
        ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
            .iter()
            .map(|host| NamedConnection::open(host, 3306, "canary_db", "canary", "secret"))
            .collect()
    }

    fn canary(store: Arc<FakeStore>, healthchecker: Arc<FakeHealthchecker>) -> Canary {
        Canary::new(store, healthchecker, Duration::ZERO)
    }

    fn answers(pairs: &[(&str, Answer)]) -> HashMap<String, Answer> {
        pairs.iter().map(|(name, a)| (name.to_string(), *a)).collect()
    }

    #[tokio::test]
    async fn test_all_nodes_healthy() {
        let store = Arc::new(FakeStore::default());
        let hc = Arc::new(FakeHealthchecker::default());
        let conns = nodes();

        let outcome = canary(store.clone(), hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(outcome, ChirpOutcome::Healthy));
        assert_eq!(
            store.calls(),
            vec![
                "write 10.0.0.1:3306",
                "check 10.0.0.1:3306",
                "check 10.0.0.2:3306",
                "check 10.0.0.3:3306",
                "cleanup 10.0.0.1:3306",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_marker_short_circuits() {
        let store = Arc::new(FakeStore {
            checks: answers(&[("10.0.0.2:3306", Answer::No)]),
            ..Default::default()
        });
        let hc = Arc::new(FakeHealthchecker::default());
        let conns = nodes();

        let outcome = canary(store.clone(), hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(outcome, ChirpOutcome::ReplicationFailure));
        let calls = store.calls();
        assert!(!calls.contains(&"check 10.0.0.3:3306".to_string()));
        assert_eq!(calls.last().map(String::as_str), Some("cleanup 10.0.0.1:3306"));
    }

    #[tokio::test]
    async fn test_unhealthy_write_node_does_nothing() {
        let store = Arc::new(FakeStore::default());
        let hc = Arc::new(FakeHealthchecker {
            answers: answers(&[("10.0.0.1:3306", Answer::No)]),
            ..Default::default()
        });
        let conns = nodes();

        let outcome = canary(store.clone(), hc).chirp(&conns, &conns[0], Utc::now()).await;

        match outcome {
            ChirpOutcome::Indeterminate(e) => {
                assert_eq!(e.to_string(), "write connection's galera is unhealthy")
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_write_node_health_error_is_indeterminate() {
        let store = Arc::new(FakeStore::default());
        let hc = Arc::new(FakeHealthchecker {
            answers: answers(&[("10.0.0.1:3306", Answer::Fail)]),
            ..Default::default()
        });
        let conns = nodes();

        let outcome = canary(store.clone(), hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(
            outcome,
            ChirpOutcome::Indeterminate(CanaryError::Database(DatabaseError::NotGalera))
        ));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_skips_read_and_cleanup() {
        let store = Arc::new(FakeStore {
            fail_write: true,
            ..Default::default()
        });
        let hc = Arc::new(FakeHealthchecker::default());
        let conns = nodes();

        let outcome = canary(store.clone(), hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(outcome, ChirpOutcome::Indeterminate(_)));
        assert_eq!(store.calls(), vec!["write 10.0.0.1:3306"]);
    }

    #[tokio::test]
    async fn test_unsynced_reader_is_skipped() {
        let store = Arc::new(FakeStore::default());
        let hc = Arc::new(FakeHealthchecker {
            answers: answers(&[("10.0.0.2:3306", Answer::No)]),
            ..Default::default()
        });
        let conns = nodes();

        let outcome = canary(store.clone(), hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(outcome, ChirpOutcome::Healthy));
        assert!(!store.calls().contains(&"check 10.0.0.2:3306".to_string()));
    }

    #[tokio::test]
    async fn test_all_reads_error_is_indeterminate() {
        let store = Arc::new(FakeStore {
            checks: answers(&[
                ("10.0.0.1:3306", Answer::Fail),
                ("10.0.0.2:3306", Answer::Fail),
                ("10.0.0.3:3306", Answer::Fail),
            ]),
            ..Default::default()
        });
        let hc = Arc::new(FakeHealthchecker::default());
        let conns = nodes();

        let outcome = canary(store.clone(), hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(outcome, ChirpOutcome::Indeterminate(_)));
        // Every node is still visited before the first error is surfaced.
        assert!(store.calls().contains(&"check 10.0.0.3:3306".to_string()));
        assert_eq!(store.calls().last().map(String::as_str), Some("cleanup 10.0.0.1:3306"));
    }

    #[tokio::test]
    async fn test_read_error_then_missing_marker_is_failure() {
        let store = Arc::new(FakeStore {
            checks: answers(&[("10.0.0.2:3306", Answer::Fail), ("10.0.0.3:3306", Answer::No)]),
            ..Default::default()
        });
        let hc = Arc::new(FakeHealthchecker::default());
        let conns = nodes();

        let outcome = canary(store, hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(outcome, ChirpOutcome::ReplicationFailure));
    }

    #[tokio::test]
    async fn test_cleanup_error_overrides_success() {
        let store = Arc::new(FakeStore {
            fail_cleanup: true,
            ..Default::default()
        });
        let hc = Arc::new(FakeHealthchecker::default());
        let conns = nodes();

        let outcome = canary(store, hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(
            outcome,
            ChirpOutcome::Indeterminate(CanaryError::Database(DatabaseError::NoActiveHost))
        ));
    }

    #[tokio::test]
    async fn test_read_error_wins_over_cleanup_error() {
        let store = Arc::new(FakeStore {
            checks: answers(&[("10.0.0.3:3306", Answer::Fail)]),
            fail_cleanup: true,
            ..Default::default()
        });
        let hc = Arc::new(FakeHealthchecker::default());
        let conns = nodes();

        let outcome = canary(store, hc).chirp(&conns, &conns[0], Utc::now()).await;

        assert!(matches!(
            outcome,
            ChirpOutcome::Indeterminate(CanaryError::Database(DatabaseError::NotGalera))
        ));
    }

    #[tokio::test]
    async fn test_health_error_on_reader_is_recorded() {
        let store = Arc::new(FakeStore::default());
        let hc = Arc::new(FakeHealthchecker {
            answers: answers(&[("10.0.0.3:3306", Answer::Fail)]),
            ..Default::default()
        });
        let conns = nodes();

        let result = canary(store, hc.clone()).read(&conns, Utc::now()).await;

        assert!(matches!(result, Err(CanaryError::Database(DatabaseError::NotGalera))));
        assert_eq!(hc.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_setup_delegates_to_store() {
        let store = Arc::new(FakeStore::default());
        let hc = Arc::new(FakeHealthchecker::default());
        let conns = nodes();

        canary(store.clone(), hc).setup(&conns[0]).await.unwrap();

        assert_eq!(store.calls(), vec!["setup 10.0.0.1:3306"]);
    }
}
