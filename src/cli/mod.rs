//! Command-line interface for chainreact.
//!
//! Provides commands for running scenario chains, validating scenario
//! files, and listing available scenarios.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use crate::config;
use crate::domain::ReactionReport;
use crate::scenario::Scenario;

/// chainreact - Run chain reactions of asynchronous particles
#[derive(Parser, Debug)]
#[command(name = "chainreact")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario
    Run {
        /// Scenario path, or name (looks for <scenarios_dir>/<name>.yaml)
        scenario: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a scenario without running it
    Validate {
        /// Scenario path or name
        scenario: String,
    },

    /// List scenarios in the scenarios directory
    List {
        /// Override the scenarios directory
        #[arg(short, long, env = config::SCENARIOS_ENV)]
        dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run { scenario, json } => run_scenario(&scenario, json).await,
            Commands::Validate { scenario } => validate_scenario(&scenario),
            Commands::List { dir } => list_scenarios(dir),
        }
    }
}

/// Run a scenario and print its report
async fn run_scenario(name: &str, json: bool) -> Result<()> {
    let scenario = load_scenario(name)?;
    let (outcome, report) = scenario.execute().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Err(e) = outcome {
        error!(scenario = %scenario.name, error = %e, "Scenario failed");
        anyhow::bail!("Scenario '{}' failed: {}", scenario.name, e);
    }

    Ok(())
}

fn print_report(report: &ReactionReport) {
    println!("Run ID: {}", report.run_id);
    println!("Scenario: {}", report.chain);
    println!("State: {:?}", report.state);
    println!("Started: {}", report.started_at);
    if let Some(completed) = report.completed_at {
        println!("Completed: {} ({}ms)", completed, report.elapsed_ms);
    }
    println!("\nParticles started:");
    for (i, name) in report.executed.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, name);
    }
    if let Some(ref error) = report.error {
        println!("\nError: {}", error);
    }
}

fn validate_scenario(name: &str) -> Result<()> {
    let scenario = load_scenario(name)?;
    println!(
        "Scenario '{}' is valid: {} step(s), {} particle(s)",
        scenario.name,
        scenario.steps.len(),
        scenario.particle_count()
    );
    Ok(())
}

fn list_scenarios(dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => config::scenarios_dir()?,
    };

    let pattern = dir.join("*.yaml");
    let pattern = pattern.to_string_lossy();
    let mut found = 0usize;

    println!("{:<24} {}", "NAME", "DESCRIPTION");
    println!("{}", "-".repeat(60));

    for entry in glob::glob(&pattern).context("Invalid scenarios directory pattern")? {
        let path = entry?;
        match Scenario::from_file(&path) {
            Ok(scenario) => {
                println!("{:<24} {}", scenario.name, scenario.description);
                found += 1;
            }
            Err(e) => {
                println!("{:<24} (unreadable: {})", path.display(), e);
            }
        }
    }

    if found == 0 {
        println!("No scenarios found in {}", dir.display());
    }

    Ok(())
}

/// Load and validate a scenario by path or by name
fn load_scenario(name: &str) -> Result<Scenario> {
    let path = resolve_scenario_path(name, &config::scenarios_dir()?)?;
    let scenario = Scenario::from_file(&path)?;
    scenario.validate()?;
    Ok(scenario)
}

fn resolve_scenario_path(name: &str, scenarios_dir: &Path) -> Result<PathBuf> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Ok(direct);
    }

    let named = scenarios_dir.join(format!("{}.yaml", name));
    if named.is_file() {
        return Ok(named);
    }

    anyhow::bail!(
        "Scenario '{}' not found. Looked for:\n  - {}\n  - {}",
        name,
        direct.display(),
        named.display()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_by_name() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.yaml");
        std::fs::write(&path, "name: hello\nsteps:\n  - name: a\n").unwrap();

        assert_eq!(resolve_scenario_path("hello", temp.path()).unwrap(), path);
        assert!(resolve_scenario_path("missing", temp.path()).is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::parse_from(["chainreact", "run", "hello", "--json"]);
        match cli.command {
            Commands::Run { scenario, json } => {
                assert_eq!(scenario, "hello");
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
