pub mod git;
pub mod manager;

pub use git::{Git2Client, SourceControl};
pub use manager::{Workspace, WorkspaceManager};
