pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::Repository;

/// Source of the repositories a run acts on.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// List every repository selected for this run.
    async fn list_repositories(&self) -> Result<Vec<Repository>>;
}
