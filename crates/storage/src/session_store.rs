// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session `info.json` metadata store.

use crate::atomic::atomic_write_json;
use crate::error::StorageError;
use amux_core::{ProjectLayout, SessionInfo};

pub struct SessionStore {
    layout: ProjectLayout,
}

impl SessionStore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn load(&self, session_id: &str) -> Result<SessionInfo, StorageError> {
        let path = self.layout.session_info_path(session_id);
        if !path.exists() {
            return Err(StorageError::NotFound(path));
        }
        let raw = std::fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Json { path, source })
    }

    pub fn save(&self, info: &SessionInfo) -> Result<(), StorageError> {
        let path = self.layout.session_info_path(info.id.as_str());
        atomic_write_json(&path, info)?;
        Ok(())
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.layout.session_info_path(session_id).exists()
    }

    /// All sessions currently on disk, in no particular order. Corrupt
    /// entries are skipped with a warning rather than failing the whole
    /// listing (a single bad file shouldn't hide every other session).
    pub fn list(&self) -> Result<Vec<SessionInfo>, StorageError> {
        let dir = self.layout.sessions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().into_owned();
            match self.load(&id) {
                Ok(info) => sessions.push(info),
                Err(e) => tracing::warn!(session_id = %id, error = %e, "skipping unreadable session"),
            }
        }
        Ok(sessions)
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
