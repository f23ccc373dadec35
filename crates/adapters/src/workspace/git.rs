// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Workspace, WorkspaceError, WorkspaceStore, GIT_WORKTREE_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Shells out to `git worktree` from `repo_root`, the checkout the
/// per-session worktrees are created from.
#[derive(Debug, Clone)]
pub struct GitWorktreeStore {
    repo_root: std::path::PathBuf,
}

impl GitWorktreeStore {
    pub fn new(repo_root: impl Into<std::path::PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    async fn run(&self, mut cmd: Command, description: &str) -> Result<std::process::Output, WorkspaceError> {
        match tokio::time::timeout(GIT_WORKTREE_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(WorkspaceError::GitFailed(format!("{description}: {e}"))),
            Err(_) => Err(WorkspaceError::Timeout(GIT_WORKTREE_TIMEOUT)),
        }
    }
}

#[async_trait]
impl WorkspaceStore for GitWorktreeStore {
    async fn create(
        &self,
        path: &Path,
        branch: &str,
        base_ref: &str,
    ) -> Result<Workspace, WorkspaceError> {
        if path.exists() {
            return Err(WorkspaceError::AlreadyExists(path.to_path_buf()));
        }

        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_root)
            .arg("worktree")
            .arg("add")
            .arg("-b")
            .arg(branch)
            .arg(path)
            .arg(base_ref);

        let output = self.run(cmd, "git worktree add").await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorkspaceError::GitFailed(stderr.to_string()));
        }

        Ok(Workspace {
            path: path.to_path_buf(),
            branch: branch.to_string(),
        })
    }

    async fn remove(&self, path: &Path) -> Result<(), WorkspaceError> {
        if self.is_worktree(path).await.unwrap_or(false) {
            let mut cmd = Command::new("git");
            cmd.current_dir(path)
                .arg("worktree")
                .arg("remove")
                .arg("--force")
                .arg(path);
            // Best-effort: a worktree that git has lost track of still
            // needs its directory removed below.
            let _ = self.run(cmd, "git worktree remove").await;
        }

        if path.exists() {
            tokio::fs::remove_dir_all(path).await?;
        }
        Ok(())
    }

    async fn is_worktree(&self, path: &Path) -> Result<bool, WorkspaceError> {
        let dot_git = path.join(".git");
        match tokio::fs::symlink_metadata(&dot_git).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(WorkspaceError::Io(e)),
        }
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
