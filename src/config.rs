use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: Option<String>,
    /// API root for GitHub Enterprise, e.g. `https://ghe.example.com/api/v3`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub orgs: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
    /// Explicit repositories as `owner/name`.
    #[serde(default)]
    pub repos: Vec<String>,
    #[serde(default = "default_true")]
    pub skip_archived: bool,
    #[serde(default)]
    pub skip_forks: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: None,
            orgs: Vec::new(),
            users: Vec::new(),
            repos: Vec::new(),
            skip_archived: true,
            skip_forks: false,
        }
    }
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("orgs", &self.orgs)
            .field("users", &self.users)
            .field("repos", &self.repos)
            .field("skip_archived", &self.skip_archived)
            .field("skip_forks", &self.skip_forks)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    #[serde(default = "default_concurrent")]
    pub concurrent: usize,
    /// Shallow clone depth; full history when unset.
    #[serde(default)]
    pub clone_depth: Option<u32>,
    /// Parent directory for workspaces; the system temp dir when unset.
    #[serde(default)]
    pub workspace_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrent: default_concurrent(),
            clone_depth: None,
            workspace_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrent() -> usize {
    1
}

/// `REPOFAN__*` overrides; list keys take comma-separated values.
fn environment() -> config::Environment {
    config::Environment::with_prefix("REPOFAN")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("github.orgs")
        .with_list_parse_key("github.users")
        .with_list_parse_key("github.repos")
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_path, environment())
    }

    fn load_with_env(config_path: Option<&str>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("repofan").required(false));
        }

        // Environment variable overrides with REPOFAN_ prefix
        builder = builder.add_source(env);

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Check the settings a run cannot start without.
    pub fn validate(&self) -> Result<()> {
        let gh = &self.github;
        if gh.orgs.is_empty() && gh.users.is_empty() && gh.repos.is_empty() {
            return Err(AppError::Config(
                "No repositories selected: pass at least one org, user or repo".to_string(),
            ));
        }
        if self.run.concurrent == 0 {
            return Err(AppError::Config(
                "concurrent must be at least 1".to_string(),
            ));
        }
        for repo in &gh.repos {
            split_full_name(repo)?;
        }
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.github.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Split `owner/name` into its two halves.
pub fn split_full_name(full_name: &str) -> Result<(&str, &str)> {
    match full_name.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(AppError::Config(format!(
            "Invalid repository name (expected owner/name): {full_name}"
        ))),
    }
}
