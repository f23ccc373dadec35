// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration (`<project>/.amux/config.yaml`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn default_idle_threshold_secs() -> u64 {
    30
}

fn default_reconcile_interval_secs() -> u64 {
    5
}

fn default_stop_grace_secs() -> u64 {
    10
}

fn default_ring_buffer_lines() -> usize {
    1_000
}

fn default_broadcast_deadline_ms() -> u64 {
    100
}

fn default_status_refresh_secs() -> u64 {
    5
}

/// Project-level tunables. Everything here has a spec-mandated default so a
/// project with no `config.yaml` still behaves per spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds of no new output before a `working` session is considered `idle`.
    pub idle_threshold_secs: u64,
    /// Reconciler sweep cadence.
    pub reconcile_interval_secs: u64,
    /// Grace period before `Stop` escalates from SIGTERM to SIGKILL.
    pub stop_grace_secs: u64,
    /// Ring buffer capacity, in whole lines.
    pub ring_buffer_lines: usize,
    /// Per-client broadcast write deadline.
    pub broadcast_deadline_ms: u64,
    /// Cadence at which the proxy overwrites `status.yaml`.
    pub status_refresh_secs: u64,
    /// Hook command table, keyed by event name ("session.start", "session.stop").
    pub hooks: BTreeMap<String, String>,
    /// Per-agent default command and environment.
    pub agents: BTreeMap<String, AgentDefaults>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_threshold_secs: default_idle_threshold_secs(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
            stop_grace_secs: default_stop_grace_secs(),
            ring_buffer_lines: default_ring_buffer_lines(),
            broadcast_deadline_ms: default_broadcast_deadline_ms(),
            status_refresh_secs: default_status_refresh_secs(),
            hooks: BTreeMap::new(),
            agents: BTreeMap::new(),
        }
    }
}

/// Default command/environment for a logical agent id (e.g. "claude").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDefaults {
    pub command: String,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

impl Config {
    /// Load `<project>/.amux/config.yaml`, falling back to defaults when
    /// the file does not exist (a project need not have one).
    pub fn load(amux_dir: &Path) -> Result<Self, ConfigError> {
        let path = amux_dir.join("config.yaml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&raw)?;
        Ok(config)
    }

    pub fn idle_threshold(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn reconcile_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn stop_grace(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.stop_grace_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Standard on-disk layout rooted at `<project>/.amux/`.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub root: PathBuf,
}

impl ProjectLayout {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            root: project_root.into().join(".amux"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    pub fn id_mappings_path(&self) -> PathBuf {
        self.root.join("id-mappings.yaml")
    }

    pub fn workspaces_dir(&self) -> PathBuf {
        self.root.join("workspaces")
    }

    pub fn workspace_dir(&self, id: &str) -> PathBuf {
        self.workspaces_dir().join(id)
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn session_dir(&self, id: &str) -> PathBuf {
        self.sessions_dir().join(id)
    }

    pub fn session_info_path(&self, id: &str) -> PathBuf {
        self.session_dir(id).join("info.json")
    }

    pub fn session_state_path(&self, id: &str) -> PathBuf {
        self.session_dir(id).join("state.json")
    }

    pub fn run_dir(&self, session_id: &str, run_id: u64) -> PathBuf {
        self.session_dir(session_id).join(run_id.to_string())
    }

    pub fn console_log_path(&self, session_id: &str, run_id: u64) -> PathBuf {
        self.run_dir(session_id, run_id).join("console.log")
    }

    pub fn status_path(&self, session_id: &str, run_id: u64) -> PathBuf {
        self.run_dir(session_id, run_id).join("status.yaml")
    }
}

/// `<tmpdir>/amux-<session-id>.sock`, with a relative fallback when the
/// absolute path would exceed the platform's `sun_path` limit.
pub fn socket_path(tmp_dir: &Path, session_id: &str) -> PathBuf {
    const SUN_PATH_LIMIT: usize = 100;
    let candidate = tmp_dir.join(format!("amux-{session_id}.sock"));
    if candidate.as_os_str().len() < SUN_PATH_LIMIT {
        candidate
    } else {
        PathBuf::from(format!("amux-{}.sock", &session_id[..session_id.len().min(8)]))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
