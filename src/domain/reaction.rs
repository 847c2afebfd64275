//! Reaction state and reporting.
//!
//! A Reaction represents a single run of a chain.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of a chain run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionState {
    /// Created, first node not yet activated
    #[default]
    NotStarted,

    /// Nodes are being activated
    Running,

    /// Every node completed without a fatal error
    Finished,

    /// A node reported a fatal error
    Failed,
}

impl ReactionState {
    /// Finished and Failed are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed)
    }
}

#[derive(Debug)]
struct Progress {
    state: ReactionState,
    completed_at: Option<DateTime<Utc>>,
}

/// Handle to a chain run; cheap to clone, shared with the running nodes
#[derive(Debug, Clone)]
pub struct Reaction {
    id: Uuid,
    chain_name: String,
    started_at: DateTime<Utc>,
    progress: Arc<Mutex<Progress>>,
}

impl Reaction {
    pub(crate) fn new(chain_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            chain_name: chain_name.into(),
            started_at: Utc::now(),
            progress: Arc::new(Mutex::new(Progress {
                state: ReactionState::NotStarted,
                completed_at: None,
            })),
        }
    }

    /// Unique identifier for this run
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chain_name(&self) -> &str {
        &self.chain_name
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the run reached a terminal state
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.lock().completed_at
    }

    pub fn state(&self) -> ReactionState {
        self.lock().state
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    pub(crate) fn begin(&self) {
        self.lock().state = ReactionState::Running;
    }

    /// Move to a terminal state. Later calls are ignored.
    pub(crate) fn settle(&self, state: ReactionState) {
        let mut progress = self.lock();
        if progress.state.is_terminal() {
            return;
        }
        progress.state = state;
        progress.completed_at = Some(Utc::now());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serializable summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionReport {
    pub run_id: Uuid,
    pub chain: String,
    pub state: ReactionState,
    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Wall-clock duration in milliseconds
    pub elapsed_ms: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Particles whose task bodies ran, in start order
    #[serde(default)]
    pub executed: Vec<String>,
}

impl ReactionReport {
    /// Summarise a reaction handle
    pub fn from_reaction(reaction: &Reaction) -> Self {
        let completed_at = reaction.completed_at();
        let elapsed_ms = completed_at
            .map(|end| (end - reaction.started_at()).num_milliseconds().max(0) as u64)
            .unwrap_or(0);

        Self {
            run_id: reaction.id(),
            chain: reaction.chain_name().to_string(),
            state: reaction.state(),
            started_at: reaction.started_at(),
            completed_at,
            elapsed_ms,
            error: None,
            executed: Vec::new(),
        }
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_executed(mut self, executed: Vec<String>) -> Self {
        self.executed = executed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_lifecycle() {
        let reaction = Reaction::new("demo");
        assert_eq!(reaction.state(), ReactionState::NotStarted);
        assert!(reaction.completed_at().is_none());

        reaction.begin();
        assert_eq!(reaction.state(), ReactionState::Running);
        assert!(!reaction.is_finished());

        reaction.settle(ReactionState::Failed);
        assert_eq!(reaction.state(), ReactionState::Failed);
        assert!(reaction.completed_at().is_some());

        // Terminal states stick
        reaction.settle(ReactionState::Finished);
        assert_eq!(reaction.state(), ReactionState::Failed);
    }

    #[test]
    fn test_state_defaults_to_not_started() {
        assert_eq!(ReactionState::default(), ReactionState::NotStarted);
        assert!(!ReactionState::default().is_terminal());
    }

    #[test]
    fn test_report_serialization() {
        let reaction = Reaction::new("demo");
        reaction.begin();
        reaction.settle(ReactionState::Finished);

        let report = ReactionReport::from_reaction(&reaction)
            .with_executed(vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("\"state\":\"finished\""));
        assert!(json.contains("\"executed\":[\"a\",\"b\"]"));
        assert!(!json.contains("\"error\""));
    }
}
