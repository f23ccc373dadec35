// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Workspace, WorkspaceError, WorkspaceStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// In-memory `WorkspaceStore` for tests: creates real directories (so
/// callers that scan the filesystem still see something) but never shells
/// out to git.
#[derive(Default)]
pub struct FakeWorkspaceStore {
    worktrees: Mutex<HashSet<PathBuf>>,
}

impl FakeWorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkspaceStore for FakeWorkspaceStore {
    async fn create(
        &self,
        path: &Path,
        branch: &str,
        _base_ref: &str,
    ) -> Result<Workspace, WorkspaceError> {
        if path.exists() {
            return Err(WorkspaceError::AlreadyExists(path.to_path_buf()));
        }
        tokio::fs::create_dir_all(path).await?;
        self.worktrees.lock().insert(path.to_path_buf());
        Ok(Workspace {
            path: path.to_path_buf(),
            branch: branch.to_string(),
        })
    }

    async fn remove(&self, path: &Path) -> Result<(), WorkspaceError> {
        self.worktrees.lock().remove(path);
        if path.exists() {
            tokio::fs::remove_dir_all(path).await?;
        }
        Ok(())
    }

    async fn is_worktree(&self, path: &Path) -> Result<bool, WorkspaceError> {
        Ok(self.worktrees.lock().contains(path))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
