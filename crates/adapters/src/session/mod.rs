// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal Adapter capability set: the capability over the
//! host's terminal-multiplexer consumed by `OutputProxy` and
//! `SessionManager`. A mock implementation lives behind the same trait for
//! tests (exported when the `test-support` feature is enabled).

mod tmux;

pub use tmux::TmuxAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTerminalAdapter;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("failed to spawn terminal session: {0}")]
    SpawnFailed(String),
    #[error("terminal command failed: {0}")]
    CommandFailed(String),
    #[error("terminal session not found: {0}")]
    NotFound(String),
    #[error("terminal multiplexer binary unavailable: {0}")]
    Unavailable(String),
}

/// Capability set exposed by a host terminal-multiplexer (tmux, or any
/// future alternate multiplexer) behind one interface, so `OutputProxy`
/// and `SessionManager` never depend on a concrete backend.
#[async_trait]
pub trait TerminalAdapter: Send + Sync {
    /// Create a detached terminal-multiplexed session named `name` running
    /// `command` in `cwd` with `env` merged over the inherited environment.
    /// Returns the backend's own session identifier (may differ from `name`).
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        command: &str,
        env: &[(String, String)],
    ) -> Result<String, TerminalError>;

    async fn has_session(&self, name: &str) -> Result<bool, TerminalError>;

    async fn kill_session(&self, name: &str) -> Result<(), TerminalError>;

    /// Append `text` followed by a newline-equivalent.
    async fn send_keys(&self, name: &str, text: &str) -> Result<(), TerminalError>;

    /// Advisory; backends that cannot resize silently ignore the request.
    async fn resize_window(&self, name: &str, cols: u16, rows: u16) -> Result<(), TerminalError>;

    /// Best-effort snapshot for the reconciler when the proxy itself is
    /// unavailable.
    async fn capture_pane(&self, name: &str) -> Result<Vec<u8>, TerminalError>;

    /// Start mirroring every byte the session's pane produces into `dest`
    /// (created if missing, appended to otherwise). Unlike `capture_pane`,
    /// which snapshots a bounded scrollback window, this is a growing
    /// file: nothing written to the pane after this call is ever dropped.
    async fn pipe_output(&self, name: &str, dest: &Path) -> Result<(), TerminalError>;
}
