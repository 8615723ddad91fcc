use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{AppError, Result};

const WORKSPACE_PREFIX: &str = "repofan-";

/// Hands out one throwaway directory per repository run.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    base_dir: PathBuf,
}

/// An exclusively owned, uniquely named directory.
///
/// The directory is removed when the guard drops, on every exit path.
/// [`Workspace::release`] does the same but reports a failed removal.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl WorkspaceManager {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.unwrap_or_else(std::env::temp_dir),
        }
    }

    /// Create a fresh workspace under the base directory.
    pub async fn acquire(&self) -> Result<Workspace> {
        let base_dir = self.base_dir.clone();

        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&base_dir).map_err(|e| {
                AppError::Workspace(format!("Failed to create workspace dir: {e}"))
            })?;
            let dir = tempfile::Builder::new()
                .prefix(WORKSPACE_PREFIX)
                .tempdir_in(&base_dir)
                .map_err(|e| AppError::Workspace(format!("Failed to create workspace: {e}")))?;
            Ok(Workspace { dir })
        })
        .await
        .map_err(|e| AppError::Workspace(format!("Workspace task panicked: {e}")))?
    }
}

impl Workspace {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now.
    pub async fn release(self) -> Result<()> {
        tokio::task::spawn_blocking(move || {
            self.dir
                .close()
                .map_err(|e| AppError::Workspace(format!("Failed to cleanup workspace: {e}")))
        })
        .await
        .map_err(|e| AppError::Workspace(format!("Cleanup task panicked: {e}")))?
    }
}
