use crate::config::GitHubConfig;
use crate::platform::types;

/// Map an octocrab Repository to our platform Repository type.
///
/// Returns `None` for entries missing the fields a clone needs.
pub fn map_repository(repo: &octocrab::models::Repository) -> Option<types::Repository> {
    let full_name = repo.full_name.clone()?;
    let clone_url = repo.clone_url.as_ref()?.to_string();
    Some(types::Repository {
        full_name,
        clone_url,
    })
}

/// Whether the selection filters exclude a listed repository.
pub fn is_filtered(archived: bool, fork: bool, config: &GitHubConfig) -> bool {
    (archived && config.skip_archived) || (fork && config.skip_forks)
}
