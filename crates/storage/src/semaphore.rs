// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace reference-count persistence.

use crate::atomic::{atomic_write_json, DirLock};
use crate::error::StorageError;
use amux_core::ProjectLayout;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SemaphoreDocument {
    pub count: u32,
    pub holders: Vec<String>,
    pub auto_created: bool,
}

pub struct WorkspaceSemaphore {
    layout: ProjectLayout,
}

impl WorkspaceSemaphore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    fn path(&self, workspace_id: &str) -> std::path::PathBuf {
        self.layout.workspace_dir(workspace_id).join("semaphore.json")
    }

    fn load(&self, workspace_id: &str) -> Result<SemaphoreDocument, StorageError> {
        let path = self.path(workspace_id);
        if !path.exists() {
            return Ok(SemaphoreDocument::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Json { path, source })
    }

    fn save(&self, workspace_id: &str, doc: &SemaphoreDocument) -> Result<(), StorageError> {
        atomic_write_json(&self.path(workspace_id), doc)?;
        Ok(())
    }

    /// Increment the claim count and record `session_id` as a holder.
    /// Returns the post-increment count. `auto_created` is recorded on
    /// first acquisition and never changed afterward.
    pub fn acquire(
        &self,
        workspace_id: &str,
        session_id: &str,
        auto_created: bool,
    ) -> Result<u32, StorageError> {
        let dir = self.layout.workspace_dir(workspace_id);
        let _lock = DirLock::acquire(&dir)?;
        let mut doc = self.load(workspace_id)?;
        if !doc.holders.iter().any(|h| h == session_id) {
            doc.holders.push(session_id.to_string());
            doc.count += 1;
        }
        if doc.count == 1 {
            doc.auto_created = auto_created;
        }
        self.save(workspace_id, &doc)?;
        Ok(doc.count)
    }

    /// Decrement the claim count and drop `session_id` from the holder
    /// list. Returns the post-decrement count and whether the workspace
    /// was flagged `auto_created`, so the caller can decide on cleanup.
    pub fn release(
        &self,
        workspace_id: &str,
        session_id: &str,
    ) -> Result<(u32, bool), StorageError> {
        let dir = self.layout.workspace_dir(workspace_id);
        let _lock = DirLock::acquire(&dir)?;
        let mut doc = self.load(workspace_id)?;
        if doc.holders.iter().any(|h| h == session_id) {
            doc.holders.retain(|h| h != session_id);
            doc.count = doc.count.saturating_sub(1);
        }
        let auto_created = doc.auto_created;
        self.save(workspace_id, &doc)?;
        Ok((doc.count, auto_created))
    }

    pub fn count(&self, workspace_id: &str) -> Result<u32, StorageError> {
        Ok(self.load(workspace_id)?.count)
    }
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
