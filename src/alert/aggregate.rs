//! Fan-out over an ordered list of alerters.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::alert::{AlertError, AlertResult, Alerter};

/// Every error collected from one fan-out, in member order.
#[derive(Debug, Default)]
pub struct AlertErrors(pub Vec<AlertError>);

impl AlertErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn into_result(self) -> AlertResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AlertError::Aggregate(self))
        }
    }
}

impl fmt::Display for AlertErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} alerter(s) failed: ", self.0.len())?;
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for AlertErrors {}

/// Runs each member in order and collects their failures.
#[derive(Clone, Default)]
pub struct AggregateAlerter {
    alerters: Vec<Arc<dyn Alerter>>,
}

impl AggregateAlerter {
    pub fn new(alerters: Vec<Arc<dyn Alerter>>) -> Self {
        Self { alerters }
    }

    pub fn len(&self) -> usize {
        self.alerters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerters.is_empty()
    }
}

#[async_trait]
impl Alerter for AggregateAlerter {
    async fn unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()> {
        let mut errors = AlertErrors::default();
        for alerter in &self.alerters {
            if let Err(e) = alerter.unhealthy(timestamp).await {
                errors.0.push(e);
            }
        }
        errors.into_result()
    }

    async fn not_unhealthy(&self, timestamp: DateTime<Utc>) -> AlertResult<()> {
        let mut errors = AlertErrors::default();
        for alerter in &self.alerters {
            if let Err(e) = alerter.not_unhealthy(timestamp).await {
                errors.0.push(e);
            }
        }
        errors.into_result()
    }
}
