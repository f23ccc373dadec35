// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates, gated behind the `test-support`
//! feature so production builds never pull them in.

use crate::ids::{SessionId, WorkspaceId};
use crate::info::SessionInfo;
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Builder for a minimal valid `SessionInfo`, with sensible test defaults
/// for every field a test doesn't care about.
pub struct SessionInfoBuilder {
    info: SessionInfo,
}

impl SessionInfoBuilder {
    pub fn new(id: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self {
            info: SessionInfo {
                id: SessionId::new(id.into()),
                index: None,
                name: None,
                description: None,
                workspace_id: WorkspaceId::new(workspace_id.into()),
                agent_id: "claude".to_string(),
                command: "echo hi".to_string(),
                environment: BTreeMap::new(),
                created_at: Utc::now(),
                started_at: None,
                stopped_at: None,
                pid: None,
                terminal_session: None,
                storage_path: PathBuf::from("/tmp/amux-test"),
                auto_created_workspace: false,
                initial_prompt: None,
                error: String::new(),
                labels: BTreeMap::new(),
                agent_run_id: None,
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.info.name = Some(name.into());
        self
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.info.index = Some(index.into());
        self
    }

    pub fn auto_created_workspace(mut self, v: bool) -> Self {
        self.info.auto_created_workspace = v;
        self
    }

    pub fn initial_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.info.initial_prompt = Some(prompt.into());
        self
    }

    pub fn build(self) -> SessionInfo {
        self.info
    }
}
