use std::collections::HashSet;

use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;

use crate::config::{split_full_name, GitHubConfig};
use crate::error::{AppError, Result};
use crate::platform::types::Repository;
use crate::platform::RepositoryProvider;

use super::mapper;

const PER_PAGE: u8 = 100;

#[derive(Serialize)]
struct PageParams {
    per_page: u8,
    page: u32,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Lists repositories of organizations, users and explicitly named
/// repositories through the GitHub REST API.
pub struct GitHubPlatform {
    config: GitHubConfig,
    client: Octocrab,
}

impl GitHubPlatform {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let mut builder = Octocrab::builder();

        if let Some(token) = config.token.as_deref().filter(|t| !t.is_empty()) {
            builder = builder.personal_token(token.to_string());
        }

        if let Some(base_url) = &config.base_url {
            builder = builder
                .base_uri(base_url.as_str())
                .map_err(|e| AppError::Config(format!("Invalid GitHub base URL: {e}")))?;
        }

        let client = builder
            .build()
            .map_err(|e| AppError::Provider(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// Walk every page of a repository listing route.
    async fn list_pages(
        &self,
        route: &str,
        kind: &'static str,
    ) -> Result<Vec<octocrab::models::Repository>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let params = PageParams {
                per_page: PER_PAGE,
                page,
                kind,
            };
            let batch: Vec<octocrab::models::Repository> = self
                .client
                .get(route, Some(&params))
                .await
                .map_err(|e| AppError::Provider(format!("Failed to list {route}: {e}")))?;

            let last = batch.len() < PER_PAGE as usize;
            all.extend(batch);
            if last {
                break;
            }
            page += 1;
        }

        Ok(all)
    }

    fn keep(&self, repo: &octocrab::models::Repository) -> bool {
        !mapper::is_filtered(
            repo.archived.unwrap_or(false),
            repo.fork.unwrap_or(false),
            &self.config,
        )
    }
}

#[async_trait]
impl RepositoryProvider for GitHubPlatform {
    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        let mut listed = Vec::new();

        for org in &self.config.orgs {
            let repos = self.list_pages(&format!("/orgs/{org}/repos"), "all").await?;
            tracing::debug!(org = %org, count = repos.len(), "Listed organization repositories");
            listed.extend(repos.into_iter().filter(|r| self.keep(r)));
        }

        for user in &self.config.users {
            let repos = self
                .list_pages(&format!("/users/{user}/repos"), "owner")
                .await?;
            tracing::debug!(user = %user, count = repos.len(), "Listed user repositories");
            listed.extend(repos.into_iter().filter(|r| self.keep(r)));
        }

        // Explicitly named repositories bypass the archived/fork filters
        for full_name in &self.config.repos {
            let (owner, name) = split_full_name(full_name)?;
            let repo = self
                .client
                .repos(owner, name)
                .get()
                .await
                .map_err(|e| AppError::Provider(format!("Failed to fetch {full_name}: {e}")))?;
            listed.push(repo);
        }

        let mut seen = HashSet::new();
        let repos = listed
            .iter()
            .filter_map(mapper::map_repository)
            .filter(|r| seen.insert(r.full_name.clone()))
            .collect();

        Ok(repos)
    }
}
