// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session `state.json` document store.

use crate::atomic::{atomic_write_json, DirLock};
use crate::error::StorageError;
use amux_core::{ProjectLayout, StateDocument};
use std::path::Path;

#[derive(Clone)]
pub struct StateStore {
    layout: ProjectLayout,
}

impl StateStore {
    pub fn new(layout: ProjectLayout) -> Self {
        Self { layout }
    }

    pub fn load(&self, session_id: &str) -> Result<StateDocument, StorageError> {
        let path = self.layout.session_state_path(session_id);
        read_json(&path)
    }

    pub fn save(&self, session_id: &str, doc: &StateDocument) -> Result<(), StorageError> {
        let path = self.layout.session_state_path(session_id);
        atomic_write_json(&path, doc)?;
        Ok(())
    }

    pub fn exists(&self, session_id: &str) -> bool {
        self.layout.session_state_path(session_id).exists()
    }

    pub fn delete(&self, session_id: &str) -> Result<(), StorageError> {
        let dir = self.layout.session_dir(session_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Take the per-session directory lock for the duration of `f`, so a
    /// load-modify-save sequence is atomic across concurrent CLI
    /// invocations and the reconciler.
    pub fn with_lock<T>(
        &self,
        session_id: &str,
        f: impl FnOnce() -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let dir = self.layout.session_dir(session_id);
        let _lock = DirLock::acquire(&dir)?;
        f()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Err(StorageError::NotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
