//! Scenario Integration Tests
//!
//! Tests for loading YAML scenarios from disk and running them end to end.

use chainreact::scenario::ScenarioError;
use chainreact::{ReactionError, ReactionState, Scenario};
use tempfile::TempDir;

const MIXED_SCENARIO: &str = r#"
name: mixed
description: Two particles, then a compound with one fatal member

steps:
  - name: A
    delay_ms: 5
  - name: B
  - compound:
      - name: C
        delay_ms: 10
      - name: D
        error: upstream unavailable
  - name: E
"#;

const TOLERANT_SCENARIO: &str = r#"
name: tolerant
description: Non-fatal errors do not halt the chain

steps:
  - name: warmup
    error: cache cold
    fatal: false
  - compound:
      - name: left
      - name: right
        delay_ms: 3
        error: retry later
        fatal: false
  - name: finish
"#;

fn write_scenario(dir: &TempDir, file: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(file);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_failing_compound_scenario() {
    let temp = TempDir::new().unwrap();
    let path = write_scenario(&temp, "mixed.yaml", MIXED_SCENARIO);

    let scenario = Scenario::from_file(&path).unwrap();
    scenario.validate().unwrap();
    assert_eq!(scenario.particle_count(), 5);

    let (outcome, report) = scenario.execute().await;

    let err = outcome.unwrap_err();
    let compound = match &err {
        ReactionError::Compound(c) => c,
        other => panic!("expected compound failure, got {:?}", other),
    };
    assert_eq!(compound.len(), 1);
    let leaf = compound.leaf_errors()[0];
    assert_eq!(leaf.particle, "D");
    assert_eq!(leaf.message, "upstream unavailable");

    // A and B complete in order before the compound starts; E never runs
    assert_eq!(&report.executed[..2], &["A", "B"]);
    let mut members = report.executed[2..].to_vec();
    members.sort();
    assert_eq!(members, vec!["C", "D"]);

    assert_eq!(report.chain, "mixed");
    assert_eq!(report.state, ReactionState::Failed);
    assert!(report.completed_at.is_some());
    assert!(report.error.as_deref().unwrap().contains("upstream unavailable"));
}

#[tokio::test]
async fn test_tolerant_scenario_finishes() {
    let scenario = Scenario::from_yaml(TOLERANT_SCENARIO).unwrap();
    scenario.validate().unwrap();

    let (outcome, report) = scenario.execute().await;

    assert!(outcome.is_ok());
    assert_eq!(report.state, ReactionState::Finished);
    assert_eq!(report.executed.len(), 4);
    assert_eq!(report.executed.first().map(String::as_str), Some("warmup"));
    assert_eq!(report.executed.last().map(String::as_str), Some("finish"));
    assert!(report.error.is_none());
}

#[tokio::test]
async fn test_report_json_shape() {
    let scenario = Scenario::from_yaml(TOLERANT_SCENARIO).unwrap();
    let (_, report) = scenario.execute().await;

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["chain"], "tolerant");
    assert_eq!(json["state"], "finished");
    assert!(json["run_id"].is_string());
    assert!(json.get("error").is_none());
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let result = Scenario::from_file(&temp.path().join("absent.yaml"));
    assert!(matches!(result, Err(ScenarioError::Io { .. })));
}

#[test]
fn test_malformed_yaml_is_parse_error() {
    let result = Scenario::from_yaml("name: [unclosed");
    assert!(matches!(result, Err(ScenarioError::Parse(_))));
}

#[test]
fn test_empty_particle_name_rejected() {
    let yaml = r#"
name: unnamed
steps:
  - name: ""
"#;
    let scenario = Scenario::from_yaml(yaml).unwrap();
    assert!(matches!(scenario.validate(), Err(ScenarioError::Invalid(_))));
}
