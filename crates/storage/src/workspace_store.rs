// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-workspace `info.json` metadata store, alongside the semaphore file
//! in the same directory.

use crate::atomic::atomic_write_json;
use crate::error::StorageError;
use amux_core::{ProjectLayout, WorkspaceRecord};

pub struct WorkspaceRecordStore {
    layout: ProjectLayout,
}

impl WorkspaceRecordStore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    fn path(&self, workspace_id: &str) -> std::path::PathBuf {
        self.layout.workspace_dir(workspace_id).join("info.json")
    }

    pub fn load(&self, workspace_id: &str) -> Result<WorkspaceRecord, StorageError> {
        let path = self.path(workspace_id);
        if !path.exists() {
            return Err(StorageError::NotFound(path));
        }
        let raw = std::fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Json { path, source })
    }

    pub fn save(&self, record: &WorkspaceRecord) -> Result<(), StorageError> {
        atomic_write_json(&self.path(record.id.as_str()), record)?;
        Ok(())
    }

    pub fn exists(&self, workspace_id: &str) -> bool {
        self.path(workspace_id).exists()
    }

    pub fn delete(&self, workspace_id: &str) -> Result<(), StorageError> {
        let dir = self.layout.workspace_dir(workspace_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// All workspace records on disk, skipping unreadable entries with a
    /// warning rather than failing the whole listing.
    pub fn list(&self) -> Result<Vec<WorkspaceRecord>, StorageError> {
        let dir = self.layout.workspaces_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            match self.load(&id) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(workspace_id = %id, error = %e, "skipping unreadable workspace"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
#[path = "workspace_store_tests.rs"]
mod tests;
