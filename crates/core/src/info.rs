// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted data model: `SessionInfo`, `StateDocument`, `WorkspaceRecord`.
//!
//! `SessionInfo` and `StateDocument` live in separate files in the same
//! session directory so that frequently-changing lifecycle state
//! (`StateDocument`) never needs to rewrite the mostly-static `SessionInfo`.

use crate::ids::{SessionId, WorkspaceId};
use crate::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted per-session identity and launch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub index: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub workspace_id: WorkspaceId,
    pub agent_id: String,
    pub command: String,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub pid: Option<u32>,
    pub terminal_session: Option<String>,
    pub storage_path: std::path::PathBuf,
    #[serde(default)]
    pub auto_created_workspace: bool,
    #[serde(default)]
    pub initial_prompt: Option<String>,
    #[serde(default)]
    pub error: String,
    /// Free-form tags, round-tripped but never interpreted by the core.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Opaque correlation id for an external caller's own run tracking.
    #[serde(default)]
    pub agent_run_id: Option<String>,
}

impl SessionInfo {
    /// `started_at <= last_output_time <= stopped_at` is only checkable in
    /// combination with a `StateDocument`; this just checks the pairwise
    /// ordering this struct alone is responsible for.
    pub fn timestamps_are_ordered(&self) -> bool {
        match (self.started_at, self.stopped_at) {
            (Some(started), Some(stopped)) => stopped >= started,
            _ => true,
        }
    }
}

/// Persisted per-session lifecycle state, mutated only through
/// `StateManager`/`SessionStore` APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub status: Status,
    pub status_changed_at: DateTime<Utc>,
    pub last_output_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_output_hash: Option<String>,
    pub last_check_at: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    /// Run counter: incremented on each `Start`, used to name `sessions/<id>/<run>/`.
    #[serde(default)]
    pub run_count: u64,
}

impl StateDocument {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: Status::Created,
            status_changed_at: now,
            last_output_time: None,
            last_output_hash: None,
            last_check_at: None,
            exit_code: None,
            run_count: 0,
        }
    }
}

/// Minimal workspace metadata the core needs to decide auto-cleanup;
/// worktree creation/removal itself is delegated to `WorkspaceStore`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub name: String,
    pub path: std::path::PathBuf,
    pub branch: Option<String>,
    pub auto_created: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "info_tests.rs"]
mod tests;
