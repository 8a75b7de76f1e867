//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::types::Config;
use anyhow::{Context, Result};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Compiled-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/kanban/)
    Project = 1,
    /// User-level config (~/.kanban/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // User dir: KANBAN_USER_DIR or ~/.kanban
        let user_dir = std::env::var("KANBAN_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".kanban")));

        // Project dir: KANBAN_PROJECT_DIR or $CWD/kanban
        let project_dir = std::env::var("KANBAN_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("kanban")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn config_file(&self, tier: ConfigTier) -> Option<PathBuf> {
        let dir = match tier {
            ConfigTier::Project => self.project_dir.as_ref(),
            ConfigTier::User => self.user_dir.as_ref(),
            ConfigTier::Defaults | ConfigTier::Environment => None,
        }?;
        Some(dir.join("config.yaml"))
    }
}

/// Lay `layer` over `base`. Mappings merge key by key; any other value
/// replaces what is below it, except `null`, which leaves `base` alone.
fn overlay(base: Value, layer: Value) -> Value {
    match (base, layer) {
        (Value::Mapping(mut below), Value::Mapping(above)) => {
            for (key, value) in above {
                let merged = match below.remove(&key) {
                    Some(existing) => overlay(existing, value),
                    None => value,
                };
                below.insert(key, merged);
            }
            Value::Mapping(below)
        }
        (base, Value::Null) => base,
        (_, layer) => layer,
    }
}

/// Read one tier's YAML file. Missing files are skipped; unreadable or
/// malformed ones are skipped with a warning.
fn read_tier(path: &Path, tier: ConfigTier) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(%tier, path = %path.display(), error = %e, "cannot read config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%tier, path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

/// Apply `KANBAN_*` overrides using `lookup` to read variables.
pub(crate) fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(db_path) = lookup("KANBAN_DB_PATH") {
        config.server.db_path = PathBuf::from(db_path);
    }

    if let Some(host) = lookup("KANBAN_HOST") {
        config.server.host = host;
    }

    if let Some(port) = lookup("KANBAN_PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("KANBAN_PORT is not a valid port: {}", port))?;
    }

    if let Some(level) = lookup("KANBAN_LOG_LEVEL") {
        config.logging.level = level;
    }

    Ok(())
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority config file that contributed, if any
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        // An explicit file replaces the file tiers
        if let Ok(explicit_path) = std::env::var("KANBAN_CONFIG_PATH") {
            let path = PathBuf::from(&explicit_path);
            let mut config = Config::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
            return Ok(Self {
                paths,
                config,
                config_path: Some(path),
            });
        }

        let mut merged = serde_yaml::to_value(Config::default())?;
        let mut config_path = None;

        for tier in [ConfigTier::Project, ConfigTier::User] {
            let Some(file) = paths.config_file(tier) else {
                continue;
            };
            if let Some(value) = read_tier(&file, tier) {
                merged = overlay(merged, value);
                config_path = Some(file);
            }
        }

        let mut config: Config = serde_yaml::from_value(merged)?;

        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_overlay_merges_nested_keys() {
        let base: Value = serde_yaml::from_str("server: {host: a, port: 1}\nlogging: {level: info}").unwrap();
        let layer: Value = serde_yaml::from_str("server: {port: 2, host: ~}").unwrap();
        let merged = overlay(base, layer);
        assert_eq!(merged["server"]["host"], Value::from("a"));
        assert_eq!(merged["server"]["port"], Value::from(2));
        assert_eq!(merged["logging"]["level"], Value::from("info"));
    }

    #[test]
    fn test_config_paths_discover() {
        let paths = ConfigPaths::discover();
        assert!(paths.project_dir.is_some());
        // user_dir may or may not exist depending on environment
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(loader.config_path().is_none());
    }

    #[test]
    fn test_project_config_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("kanban");
        std::fs::create_dir_all(&project_dir).unwrap();

        let config_content = r#"
server:
  port: 8080
"#;
        std::fs::write(project_dir.join("config.yaml"), config_content).unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(temp.path().join("user")));

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("kanban");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        let project_config = r#"
server:
  port: 8080
  host: 0.0.0.0
"#;
        std::fs::write(project_dir.join("config.yaml"), project_config).unwrap();

        let user_config = r#"
server:
  port: 9090
"#;
        std::fs::write(user_dir.join("config.yaml"), user_config).unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir.clone()));

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(loader.config_path(), Some(user_dir.join("config.yaml").as_path()));
    }

    #[test]
    fn test_malformed_tier_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("kanban");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "server: [unclosed").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().server.port, 3000);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("KANBAN_DB_PATH", "/tmp/k.db"),
            ("KANBAN_HOST", "0.0.0.0"),
            ("KANBAN_PORT", "4000"),
            ("KANBAN_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.server.db_path, PathBuf::from("/tmp/k.db"));
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_env_bad_port_is_error() {
        let mut config = Config::default();
        let result = apply_env_overrides(&mut config, |k| {
            (k == "KANBAN_PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }
}
