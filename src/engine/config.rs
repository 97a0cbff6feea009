//! deploy-lock Configuration Module
//! Loads deploylock.config.json and applies environment overrides

use crate::engine::github::{RepoRef, GITHUB_API_URL};
use crate::engine::locks::{LOCK_BRANCH, LOCK_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = "deploylock.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid config format: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("No repository configured (use --repo or set GITHUB_REPOSITORY)")]
    MissingRepository,
    #[error("Invalid repository '{0}': expected OWNER/NAME")]
    InvalidRepository(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_lock_branch")]
    pub lock_branch: String,
    #[serde(default = "default_lock_file")]
    pub lock_file: String,
    #[serde(default)]
    pub strict_branch_probe: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    GITHUB_API_URL.to_string()
}

fn default_lock_branch() -> String {
    LOCK_BRANCH.to_string()
}

fn default_lock_file() -> String {
    LOCK_FILE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: None,
            api_url: default_api_url(),
            lock_branch: default_lock_branch(),
            lock_file: default_lock_file(),
            strict_branch_probe: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load an explicit config file. The file must exist.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load `deploylock.config.json` from `dir` if present, defaults otherwise.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_file(&config_path)
    }

    /// Apply `GITHUB_REPOSITORY` and `GITHUB_API_URL` from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(repo) = non_empty("GITHUB_REPOSITORY") {
            self.repository = Some(repo);
        }
        if let Some(url) = non_empty("GITHUB_API_URL") {
            self.api_url = url;
        }
        self
    }

    pub fn repo_ref(&self) -> Result<RepoRef, ConfigError> {
        let repo = self
            .repository
            .as_deref()
            .ok_or(ConfigError::MissingRepository)?;
        repo.parse()
            .map_err(|_| ConfigError::InvalidRepository(repo.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// First non-empty token from the usual CI variables.
pub fn token_from_env_with<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    ["GITHUB_TOKEN", "INPUT_GITHUB-TOKEN", "INPUT_GITHUB_TOKEN"]
        .iter()
        .filter_map(|key| lookup(key))
        .find(|v| !v.trim().is_empty())
}

pub fn token_from_env() -> Option<String> {
    token_from_env_with(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.lock_branch, "branch-deploy-lock");
        assert_eq!(config.lock_file, "lock.json");
        assert_eq!(config.api_url, "https://api.github.com");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"repository": "octo/widgets", "strict_branch_probe": true}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.repository.as_deref(), Some("octo/widgets"));
        assert!(config.strict_branch_probe);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempdir().unwrap();
        let config = Config {
            repository: Some("octo/widgets".to_string()),
            timeout_secs: 5,
            ..Config::default()
        };
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            serde_json::to_string_pretty(&config).unwrap(),
        )
        .unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempdir().unwrap();
        let result = Config::load_file(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let config = Config {
            repository: Some("octo/old".to_string()),
            ..Config::default()
        }
        .with_env_from(env(&[
            ("GITHUB_REPOSITORY", "octo/new"),
            ("GITHUB_API_URL", "https://ghe.example.com/api/v3"),
        ]));

        assert_eq!(config.repo_ref().unwrap(), RepoRef::new("octo", "new"));
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let config = Config::default().with_env_from(env(&[("GITHUB_REPOSITORY", "  ")]));
        assert!(matches!(
            config.repo_ref(),
            Err(ConfigError::MissingRepository)
        ));
    }

    #[test]
    fn test_invalid_repository() {
        let config = Config {
            repository: Some("widgets".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.repo_ref(),
            Err(ConfigError::InvalidRepository(_))
        ));
    }

    #[test]
    fn test_token_precedence() {
        assert_eq!(
            token_from_env_with(env(&[
                ("GITHUB_TOKEN", "a"),
                ("INPUT_GITHUB-TOKEN", "b"),
            ])),
            Some("a".to_string())
        );
        assert_eq!(
            token_from_env_with(env(&[("GITHUB_TOKEN", ""), ("INPUT_GITHUB-TOKEN", "b")])),
            Some("b".to_string())
        );
        assert_eq!(token_from_env_with(env(&[])), None);
    }
}
