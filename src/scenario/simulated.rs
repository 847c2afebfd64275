//! Simulated particles for scenarios.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::core::AsyncTask;

/// Error reported by a simulated particle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("particle '{particle}' failed: {message}")]
pub struct SimulatedError {
    pub particle: String,
    pub message: String,
}

/// Shared record of which particles started, in start order
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
    }

    /// Snapshot of recorded names
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Sleeps, then succeeds or fails with a configured message
#[derive(Debug, Clone)]
pub struct SimulatedParticle {
    name: String,
    delay: Duration,
    error: Option<String>,
    journal: Journal,
}

impl SimulatedParticle {
    pub fn new(name: impl Into<String>, delay: Duration, error: Option<String>, journal: Journal) -> Self {
        Self {
            name: name.into(),
            delay,
            error,
            journal,
        }
    }
}

#[async_trait]
impl AsyncTask<SimulatedError> for SimulatedParticle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), SimulatedError> {
        self.journal.record(&self.name);
        debug!(particle = %self.name, delay_ms = self.delay.as_millis() as u64, "Simulating work");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.error {
            Some(message) => Err(SimulatedError {
                particle: self.name.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_failure_records_then_errors() {
        let journal = Journal::new();
        let particle = SimulatedParticle::new(
            "fetch",
            Duration::from_millis(5),
            Some("timeout".to_string()),
            journal.clone(),
        );

        let err = particle.run().await.unwrap_err();
        assert_eq!(err.to_string(), "particle 'fetch' failed: timeout");
        assert_eq!(journal.entries(), vec!["fetch"]);
    }
}
