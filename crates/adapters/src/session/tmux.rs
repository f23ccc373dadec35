// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tmux-backed `TerminalAdapter`.

use super::{TerminalAdapter, TerminalError};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// tmux session names are prefixed so amux's own sessions are easy to spot
/// (and to avoid clobbering an unrelated tmux session of the same name).
pub fn tmux_session_name(name: &str) -> String {
    format!("amux-{name}")
}

/// Distinguishes "the `tmux` binary isn't installed" from any other
/// spawn failure, so callers can tell `TerminalUnavailable` apart from a
/// transient command error.
fn map_spawn_error(e: std::io::Error) -> TerminalError {
    if e.kind() == std::io::ErrorKind::NotFound {
        TerminalError::Unavailable(e.to_string())
    } else {
        TerminalError::CommandFailed(e.to_string())
    }
}

#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TerminalAdapter for TmuxAdapter {
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        command: &str,
        env: &[(String, String)],
    ) -> Result<String, TerminalError> {
        if !cwd.exists() {
            return Err(TerminalError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let session_id = tmux_session_name(name);

        let existing = Command::new("tmux")
            .args(["has-session", "-t", &session_id])
            .output()
            .await;
        if existing.map(|o| o.status.success()).unwrap_or(false) {
            tracing::warn!(session_id, "tmux session already exists, killing first");
            let _ = Command::new("tmux")
                .args(["kill-session", "-t", &session_id])
                .output()
                .await;
        }

        let mut tmux_cmd = Command::new("tmux");
        tmux_cmd
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(&session_id)
            .arg("-c")
            .arg(cwd);
        for (key, value) in env {
            tmux_cmd.arg("-e").arg(format!("{key}={value}"));
        }
        tmux_cmd.arg(command);

        let output = tmux_cmd
            .output()
            .await
            .map_err(map_spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session_id, stderr = %stderr, "tmux spawn failed");
            return Err(TerminalError::SpawnFailed(stderr.to_string()));
        }

        Ok(session_id)
    }

    async fn has_session(&self, name: &str) -> Result<bool, TerminalError> {
        let output = Command::new("tmux")
            .args(["has-session", "-t", name])
            .output()
            .await
            .map_err(map_spawn_error)?;
        Ok(output.status.success())
    }

    async fn kill_session(&self, name: &str) -> Result<(), TerminalError> {
        // Best-effort: the session might already be dead, which is fine.
        let _ = Command::new("tmux")
            .args(["kill-session", "-t", name])
            .output()
            .await
            .map_err(map_spawn_error)?;
        Ok(())
    }

    async fn send_keys(&self, name: &str, text: &str) -> Result<(), TerminalError> {
        let output = Command::new("tmux")
            .args(["send-keys", "-t", name, "-l", "--", text])
            .output()
            .await
            .map_err(map_spawn_error)?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }

        let enter = Command::new("tmux")
            .args(["send-keys", "-t", name, "Enter"])
            .output()
            .await
            .map_err(map_spawn_error)?;
        if !enter.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn resize_window(&self, name: &str, cols: u16, rows: u16) -> Result<(), TerminalError> {
        let output = Command::new("tmux")
            .args([
                "resize-window",
                "-t",
                name,
                "-x",
                &cols.to_string(),
                "-y",
                &rows.to_string(),
            ])
            .output()
            .await
            .map_err(map_spawn_error)?;
        if !output.status.success() {
            // Advisory: a backend that can't resize just logs.
            tracing::warn!(name, "tmux resize-window failed (non-fatal)");
        }
        Ok(())
    }

    async fn capture_pane(&self, name: &str) -> Result<Vec<u8>, TerminalError> {
        let output = Command::new("tmux")
            .args(["capture-pane", "-t", name, "-p", "-S", "-200"])
            .output()
            .await
            .map_err(map_spawn_error)?;
        if !output.status.success() {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        Ok(output.stdout)
    }

    async fn pipe_output(&self, name: &str, dest: &Path) -> Result<(), TerminalError> {
        let shell_cmd = format!("cat >> {}", shell_quote(dest));
        let output = Command::new("tmux")
            .args(["pipe-pane", "-t", name, "-O", &shell_cmd])
            .output()
            .await
            .map_err(map_spawn_error)?;
        if !output.status.success() {
            return Err(TerminalError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(())
    }
}

/// Single-quotes a path for embedding in the shell command `pipe-pane -O`
/// runs, escaping any single quote the path itself contains.
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', "'\\''"))
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
