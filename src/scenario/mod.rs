//! Scenario definitions and loading.
//!
//! Scenarios are defined in YAML and describe a chain of simulated
//! particles, optionally grouped into compounds.

pub mod simulated;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Chain, FailurePolicy, Particle, Spawned};
use crate::domain::{ReactionError, ReactionReport};

pub use simulated::{Journal, SimulatedError, SimulatedParticle};

/// Errors loading or validating a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// A complete scenario definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Scenario name (used in CLI and reports)
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Ordered steps
    pub steps: Vec<StepSpec>,
}

/// A step: either a single particle or a compound of steps
///
/// - Particle: `{ name: fetch, delay_ms: 100 }`
/// - Compound: `{ compound: [ { name: a }, { name: b } ] }`
///
/// Unknown keys are rejected in both forms, so a misspelled field is a parse
/// error rather than a silently ignored setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepSpec {
    Compound(CompoundSpec),
    Particle(ParticleSpec),
}

/// Steps run concurrently and joined
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompoundSpec {
    pub compound: Vec<StepSpec>,
}

/// A simulated particle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticleSpec {
    /// Particle name (unique within scenario)
    pub name: String,

    /// Simulated work duration
    #[serde(default)]
    pub delay_ms: u64,

    /// If set, the particle reports this error message
    #[serde(default)]
    pub error: Option<String>,

    /// Whether a reported error halts the chain
    #[serde(default = "default_fatal")]
    pub fatal: bool,
}

fn default_fatal() -> bool {
    true
}

impl Scenario {
    /// Load a scenario from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a scenario from YAML content
    pub fn from_yaml(content: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Validate the scenario definition
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.is_empty() {
            return Err(ScenarioError::Invalid("scenario name cannot be empty".into()));
        }

        if self.steps.is_empty() {
            return Err(ScenarioError::Invalid(
                "scenario must have at least one step".into(),
            ));
        }

        let mut seen = HashSet::new();
        validate_steps(&self.steps, &mut seen)
    }

    /// Build the chain. The journal records each particle as it starts.
    pub fn build(&self) -> (Chain<SimulatedError>, Journal) {
        let journal = Journal::new();
        let chain = build_chain(&self.name, &self.steps, &journal);
        (chain, journal)
    }

    /// Build, run to completion, and summarise
    pub async fn execute(&self) -> (Result<(), ReactionError<SimulatedError>>, ReactionReport) {
        let (chain, journal) = self.build();
        let pending = chain.react();
        let reaction = pending.reaction().clone();
        let outcome = pending.await;

        let mut report = ReactionReport::from_reaction(&reaction).with_executed(journal.entries());
        if let Err(ref e) = outcome {
            report = report.with_error(e.to_string());
        }

        (outcome, report)
    }

    /// Total number of particles, including those inside compounds
    pub fn particle_count(&self) -> usize {
        count_particles(&self.steps)
    }
}

fn validate_steps<'a>(steps: &'a [StepSpec], seen: &mut HashSet<&'a str>) -> Result<(), ScenarioError> {
    for step in steps {
        match step {
            StepSpec::Compound(group) => validate_steps(&group.compound, seen)?,
            StepSpec::Particle(particle) => {
                if particle.name.is_empty() {
                    return Err(ScenarioError::Invalid("particle has an empty name".into()));
                }
                if !seen.insert(particle.name.as_str()) {
                    return Err(ScenarioError::Invalid(format!(
                        "duplicate particle name '{}'",
                        particle.name
                    )));
                }
            }
        }
    }
    Ok(())
}

fn build_chain(name: &str, steps: &[StepSpec], journal: &Journal) -> Chain<SimulatedError> {
    let mut chain = Chain::named(name);
    for step in steps {
        match step {
            StepSpec::Compound(group) => {
                let members = build_chain(name, &group.compound, journal);
                chain.add_compound(&members);
            }
            StepSpec::Particle(spec) => {
                let policy = if spec.fatal {
                    FailurePolicy::always_fatal()
                } else {
                    FailurePolicy::never_fatal()
                };
                let task = SimulatedParticle::new(
                    spec.name.clone(),
                    Duration::from_millis(spec.delay_ms),
                    spec.error.clone(),
                    journal.clone(),
                );
                chain.push(
                    Particle::new(Spawned::new(task))
                        .named(spec.name.clone())
                        .with_policy(policy),
                );
            }
        }
    }
    chain
}

fn count_particles(steps: &[StepSpec]) -> usize {
    steps
        .iter()
        .map(|step| match step {
            StepSpec::Compound(group) => count_particles(&group.compound),
            StepSpec::Particle(_) => 1,
        })
        .sum()
}
