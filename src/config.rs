//! Configuration for the chainreact CLI.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variable (CHAINREACT_SCENARIOS)
//! 2. Config file (.chainreact/config.yaml)
//! 3. Defaults (./scenarios if present, else ~/.chainreact/scenarios)
//!
//! Config file discovery:
//! - Searches current directory and parents for .chainreact/config.yaml
//! - Paths in config file are relative to the project root (parent of .chainreact/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment override for the scenarios directory
pub const SCENARIOS_ENV: &str = "CHAINREACT_SCENARIOS";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Scenario directory (relative to project root)
    pub scenarios: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Directory searched for `<name>.yaml` scenarios
    pub scenarios_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching a directory and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".chainreact").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Pick the scenarios directory from already-gathered sources
fn resolve_scenarios_dir(
    env_override: Option<String>,
    config: Option<(&Path, &ConfigFile)>,
    cwd: &Path,
    home: Option<PathBuf>,
) -> PathBuf {
    if let Some(dir) = env_override {
        return PathBuf::from(dir);
    }

    if let Some((config_path, file)) = config {
        if let Some(ref scenarios) = file.paths.scenarios {
            // Base directory is the parent of .chainreact/
            let base_dir = config_path
                .parent()
                .and_then(|p| p.parent())
                .unwrap_or(Path::new("."));
            return resolve_path(base_dir, scenarios);
        }
    }

    let local = cwd.join("scenarios");
    if local.is_dir() {
        return local;
    }

    home.map(|h| h.join(".chainreact").join("scenarios"))
        .unwrap_or(local)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let config_file = find_config_file(&cwd);

    let parsed = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };

    let scenarios_dir = resolve_scenarios_dir(
        std::env::var(SCENARIOS_ENV).ok(),
        config_file.as_deref().zip(parsed.as_ref()),
        &cwd,
        dirs::home_dir(),
    );

    Ok(ResolvedConfig {
        scenarios_dir,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the scenarios directory
pub fn scenarios_dir() -> Result<PathBuf> {
    Ok(config()?.scenarios_dir.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".chainreact");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
paths:
  scenarios: ./reactions
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.paths.scenarios, Some("./reactions".to_string()));

        let found = find_config_file(&temp.path().join("nested").join("deeper"));
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_env_override_wins() {
        let file = ConfigFile {
            version: "1.0".to_string(),
            paths: PathsConfig {
                scenarios: Some("from-file".to_string()),
            },
        };
        let dir = resolve_scenarios_dir(
            Some("/env/scenarios".to_string()),
            Some((Path::new("/project/.chainreact/config.yaml"), &file)),
            Path::new("/cwd"),
            None,
        );
        assert_eq!(dir, PathBuf::from("/env/scenarios"));
    }

    #[test]
    fn test_config_path_relative_to_project_root() {
        let file = ConfigFile {
            version: "1.0".to_string(),
            paths: PathsConfig {
                scenarios: Some("reactions".to_string()),
            },
        };
        let dir = resolve_scenarios_dir(
            None,
            Some((Path::new("/project/.chainreact/config.yaml"), &file)),
            Path::new("/cwd"),
            None,
        );
        assert_eq!(dir, PathBuf::from("/project/reactions"));
    }

    #[test]
    fn test_falls_back_to_home() {
        let temp = TempDir::new().unwrap();
        let dir = resolve_scenarios_dir(None, None, temp.path(), Some(PathBuf::from("/home/me")));
        assert_eq!(dir, PathBuf::from("/home/me/.chainreact/scenarios"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/./subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
