//! Alerter that gates cluster traffic on one proxy.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::alert::{AlertResult, Alerter};
use crate::switchboard::TrafficController;

/// Disables traffic when unhealthy and re-enables it on recovery.
///
/// With `notify_only` set both transitions are ignored.
pub struct SwitchboardAlerter {
    controller: Arc<dyn TrafficController>,
    notify_only: bool,
}

impl SwitchboardAlerter {
    pub fn new(controller: Arc<dyn TrafficController>, notify_only: bool) -> Self {
        Self {
            controller,
            notify_only,
        }
    }
}

#[async_trait]
impl Alerter for SwitchboardAlerter {
    async fn unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()> {
        if self.notify_only {
            tracing::debug!(timestamp = %timestamp, "Notify-only mode, leaving cluster traffic enabled");
            return Ok(());
        }
        self.controller.disable_cluster_traffic().await?;
        Ok(())
    }

    async fn not_unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()> {
        if self.notify_only {
            tracing::debug!(timestamp = %timestamp, "Notify-only mode, not touching cluster traffic");
            return Ok(());
        }
        self.controller.enable_cluster_traffic().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertError;
    use crate::switchboard::{SwitchboardError, SwitchboardResult};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeController {
        calls: Mutex<Vec<&'static str>>,
        fail: bool,
    }

    impl FakeController {
        fn record(&self, call: &'static str) -> SwitchboardResult<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                return Err(SwitchboardError::TrafficRejected {
                    action: "disabling cluster traffic",
                    status: 500,
                    body: "nope".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TrafficController for FakeController {
        async fn enable_cluster_traffic(&self) -> SwitchboardResult<()> {
            self.record("enable")
        }

        async fn disable_cluster_traffic(&self) -> SwitchboardResult<()> {
            self.record("disable")
        }
    }

    #[tokio::test]
    async fn test_toggles_traffic() {
        let controller = Arc::new(FakeController::default());
        let alerter = SwitchboardAlerter::new(controller.clone(), false);

        alerter.unhealthy(Utc::now()).await.unwrap();
        alerter.not_unhealthy(Utc::now()).await.unwrap();

        assert_eq!(*controller.calls.lock().unwrap(), vec!["disable", "enable"]);
    }

    #[tokio::test]
    async fn test_notify_only_is_a_no_op() {
        let controller = Arc::new(FakeController::default());
        let alerter = SwitchboardAlerter::new(controller.clone(), true);

        alerter.unhealthy(Utc::now()).await.unwrap();
        alerter.not_unhealthy(Utc::now()).await.unwrap();

        assert!(controller.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_controller_error_is_returned() {
        let controller = Arc::new(FakeController {
            fail: true,
            ..Default::default()
        });
        let alerter = SwitchboardAlerter::new(controller, false);

        let err = alerter.unhealthy(Utc::now()).await.unwrap_err();
        assert!(matches!(err, AlertError::Switchboard(_)));
    }
}
