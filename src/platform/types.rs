use serde::{Deserialize, Serialize};

/// A remote repository the run should act on.
///
/// Holds no credential; [`Repository::access_url`] embeds one on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub clone_url: String,
}

impl Repository {
    pub fn new(full_name: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            clone_url: clone_url.into(),
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Clone URL with the credential embedded as HTTPS userinfo.
    ///
    /// Non-HTTPS URLs and an absent or empty credential return the plain URL.
    pub fn access_url(&self, credential: Option<&str>) -> String {
        let token = match credential {
            Some(t) if !t.is_empty() => t,
            _ => return self.clone_url.clone(),
        };
        match self.clone_url.strip_prefix("https://") {
            Some(rest) => format!(
                "https://x-access-token:{}@{rest}",
                urlencoding::encode(token)
            ),
            None => self.clone_url.clone(),
        }
    }
}
