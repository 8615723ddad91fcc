use serde::Serialize;

use crate::error::Result;

/// Outcome of one repository's run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The action exited with status zero.
    Success,
    /// Skipped because the run was cancelled before it started.
    Aborted,
    /// Workspace, clone or action failed.
    Failed { error: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl From<Result<()>> for Outcome {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Outcome::Success,
            Err(e) => Outcome::Failed {
                error: e.to_string(),
            },
        }
    }
}
