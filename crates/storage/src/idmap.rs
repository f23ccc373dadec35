// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic short-ID allocator and bidirectional id map.
//!
//! Persisted as a single YAML file (`id-mappings.yaml`) guarded by a
//! process-wide mutex in-process and an `fs2` advisory lock across
//! processes. Reverse maps are rebuilt on load.

use crate::atomic::{atomic_write_yaml, DirLock};
use crate::error::StorageError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Namespace {
    next_index: u64,
    #[serde(default)]
    short_to_full: HashMap<String, String>,
}

impl Namespace {
    fn add(&mut self, full: &str) -> String {
        if let Some(existing) = self
            .short_to_full
            .iter()
            .find(|(_, f)| f.as_str() == full)
            .map(|(short, _)| short.clone())
        {
            return existing;
        }
        self.next_index += 1;
        let short = self.next_index.to_string();
        self.short_to_full.insert(short.clone(), full.to_string());
        short
    }

    fn remove(&mut self, full: &str) {
        self.short_to_full.retain(|_, f| f != full);
        // next_index is never decremented.
    }

    fn full_of(&self, short: &str) -> Option<String> {
        self.short_to_full.get(short).cloned()
    }

    fn short_of(&self, full: &str) -> Option<String> {
        self.short_to_full
            .iter()
            .find(|(_, f)| f.as_str() == full)
            .map(|(short, _)| short.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OnDisk {
    #[serde(default)]
    sessions: Namespace,
    #[serde(default)]
    workspaces: Namespace,
}

/// Bidirectional short-index <-> full-id map for both sessions and
/// workspaces, backed by one YAML file.
pub struct IdMap {
    path: PathBuf,
    inner: Mutex<OnDisk>,
}

impl IdMap {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let inner = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&raw).map_err(|source| StorageError::Yaml {
                path: path.clone(),
                source,
            })?
        } else {
            OnDisk::default()
        };
        Ok(Self {
            path,
            inner: Mutex::new(inner),
        })
    }

    /// Reads the on-disk document fresh, bypassing the in-process cache.
    /// Must only be called while holding the directory lock: it's the
    /// read half of the read-modify-write every mutator performs, and a
    /// stale read here is exactly the race this exists to prevent.
    fn reload(&self) -> Result<OnDisk, StorageError> {
        if !self.path.exists() {
            return Ok(OnDisk::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        serde_yaml::from_str(&raw).map_err(|source| StorageError::Yaml {
            path: self.path.clone(),
            source,
        })
    }

    /// Runs `f` against the true on-disk state under the directory lock,
    /// persists whatever `f` leaves in `doc`, and refreshes the in-process
    /// cache so subsequent `get_*` calls in this process see the change.
    /// Two concurrent processes each calling a mutator race only on who
    /// takes the lock first, never on a cached `next_index`.
    fn mutate<T>(&self, f: impl FnOnce(&mut OnDisk) -> T) -> Result<T, StorageError> {
        let _lock = DirLock::acquire(self.lock_dir())?;
        let mut doc = self.reload()?;
        let result = f(&mut doc);
        atomic_write_yaml(&self.path, &doc)?;
        *self.inner.lock() = doc;
        Ok(result)
    }

    /// Idempotent: returns the existing mapping if `full` is already
    /// present, otherwise allocates the next index. Failures here are
    /// confined to disk errors; callers should tolerate `Err` by
    /// proceeding with no short index rather than failing session creation.
    pub fn add_session(&self, full: &str) -> Result<String, StorageError> {
        self.mutate(|doc| doc.sessions.add(full))
    }

    pub fn get_session_full(&self, short: &str) -> Option<String> {
        self.inner.lock().sessions.full_of(short)
    }

    pub fn get_session_short(&self, full: &str) -> Option<String> {
        self.inner.lock().sessions.short_of(full)
    }

    pub fn remove_session(&self, full: &str) -> Result<(), StorageError> {
        self.mutate(|doc| doc.sessions.remove(full))
    }

    pub fn add_workspace(&self, full: &str) -> Result<String, StorageError> {
        self.mutate(|doc| doc.workspaces.add(full))
    }

    pub fn get_workspace_full(&self, short: &str) -> Option<String> {
        self.inner.lock().workspaces.full_of(short)
    }

    pub fn get_workspace_short(&self, full: &str) -> Option<String> {
        self.inner.lock().workspaces.short_of(full)
    }

    pub fn remove_workspace(&self, full: &str) -> Result<(), StorageError> {
        self.mutate(|doc| doc.workspaces.remove(full))
    }

    fn lock_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[cfg(test)]
#[path = "idmap_tests.rs"]
mod tests;
