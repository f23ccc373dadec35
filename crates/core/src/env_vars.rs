// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables injected into the agent process.
//!
//! All implementers MUST emit this stable `AMUX_*` prefix so hooks and the
//! agent itself can rely on it.

use crate::ids::{SessionId, WorkspaceId};
use std::collections::BTreeMap;
use std::path::Path;

pub const SESSION_ID: &str = "AMUX_SESSION_ID";
pub const SESSION_INDEX: &str = "AMUX_SESSION_INDEX";
pub const AGENT_ID: &str = "AMUX_AGENT_ID";
pub const SESSION_NAME: &str = "AMUX_SESSION_NAME";
pub const SESSION_DESCRIPTION: &str = "AMUX_SESSION_DESCRIPTION";
pub const WORKSPACE_ID: &str = "AMUX_WORKSPACE_ID";
pub const WORKSPACE_NAME: &str = "AMUX_WORKSPACE_NAME";
pub const WORKSPACE_PATH: &str = "AMUX_WORKSPACE_PATH";
pub const WORKSPACE_BRANCH: &str = "AMUX_WORKSPACE_BRANCH";
pub const PROJECT_ROOT: &str = "AMUX_PROJECT_ROOT";
pub const CONFIG_DIR: &str = "AMUX_CONFIG_DIR";
pub const EVENT: &str = "AMUX_EVENT";

/// Everything needed to build the `AMUX_*` environment for a session,
/// shared by the proxy launch path and hook execution.
#[derive(Debug, Clone)]
pub struct SessionEnvContext {
    pub session_id: SessionId,
    pub session_index: Option<String>,
    pub agent_id: String,
    pub session_name: Option<String>,
    pub session_description: Option<String>,
    pub workspace_id: WorkspaceId,
    pub workspace_name: String,
    pub workspace_path: std::path::PathBuf,
    pub workspace_branch: Option<String>,
    pub project_root: std::path::PathBuf,
    pub config_dir: std::path::PathBuf,
}

impl SessionEnvContext {
    /// Build the full `AMUX_*` variable map, optionally layering in
    /// `AMUX_EVENT` for hook invocations.
    pub fn to_env_map(&self, event: Option<&str>) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(SESSION_ID.to_string(), self.session_id.as_str().to_string());
        if let Some(idx) = &self.session_index {
            env.insert(SESSION_INDEX.to_string(), idx.clone());
        }
        env.insert(AGENT_ID.to_string(), self.agent_id.clone());
        if let Some(name) = &self.session_name {
            env.insert(SESSION_NAME.to_string(), name.clone());
        }
        if let Some(desc) = &self.session_description {
            env.insert(SESSION_DESCRIPTION.to_string(), desc.clone());
        }
        env.insert(
            WORKSPACE_ID.to_string(),
            self.workspace_id.as_str().to_string(),
        );
        env.insert(WORKSPACE_NAME.to_string(), self.workspace_name.clone());
        env.insert(
            WORKSPACE_PATH.to_string(),
            path_to_string(&self.workspace_path),
        );
        if let Some(branch) = &self.workspace_branch {
            env.insert(WORKSPACE_BRANCH.to_string(), branch.clone());
        }
        env.insert(PROJECT_ROOT.to_string(), path_to_string(&self.project_root));
        env.insert(CONFIG_DIR.to_string(), path_to_string(&self.config_dir));
        if let Some(event) = event {
            env.insert(EVENT.to_string(), event.to_string());
        }
        env
    }
}

fn path_to_string(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

#[cfg(test)]
#[path = "env_vars_tests.rs"]
mod tests;
