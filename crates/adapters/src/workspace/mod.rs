// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkspaceStore`: the external collaborator that owns git-worktree-backed
//! workspace directories. `SessionManager` creates and tears down workspaces
//! through this trait; it never shells out to `git` directly.

mod git;

pub use git::GitWorktreeStore;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorkspaceStore;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const GIT_WORKTREE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("git command failed: {0}")]
    GitFailed(String),
    #[error("git worktree operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("workspace path already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("workspace not found: {0}")]
    NotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A created workspace directory and the branch checked out into it.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub path: PathBuf,
    pub branch: String,
}

/// Capability to create and destroy per-session (or shared, ref-counted)
/// working directories backed by `git worktree`.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Creates a new worktree at `path` on a new branch named `branch`,
    /// based on `base_ref` (e.g. `HEAD`).
    async fn create(
        &self,
        path: &std::path::Path,
        branch: &str,
        base_ref: &str,
    ) -> Result<Workspace, WorkspaceError>;

    /// Removes the worktree at `path` (`git worktree remove --force`) and
    /// any remaining directory contents. Idempotent: removing an
    /// already-gone workspace is not an error.
    async fn remove(&self, path: &std::path::Path) -> Result<(), WorkspaceError>;

    /// True if `path` is a registered git worktree (has a `.git` file, not
    /// a `.git` directory).
    async fn is_worktree(&self, path: &std::path::Path) -> Result<bool, WorkspaceError>;
}
