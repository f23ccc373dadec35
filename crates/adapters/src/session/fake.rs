// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `TerminalAdapter` used by other crates' tests.

use super::{TerminalAdapter, TerminalError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct FakeSession {
    cwd: PathBuf,
    command: String,
    env: Vec<(String, String)>,
    keys: Vec<String>,
    alive: bool,
    buffer: Vec<u8>,
    pipe_dest: Option<PathBuf>,
}

/// Records every call it receives so tests can assert on them, instead of
/// shelling out to a real terminal multiplexer.
#[derive(Default)]
pub struct FakeTerminalAdapter {
    sessions: Mutex<HashMap<String, FakeSession>>,
}

impl FakeTerminalAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds bytes as if the backend process had written them to its pane,
    /// so `capture_pane` callers observe them. Also appended to the
    /// `pipe_output` destination, if one was registered, so tests can
    /// exercise the proxy's file-tail path instead of `capture_pane`.
    pub fn push_output(&self, name: &str, bytes: &[u8]) {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(name) {
            session.buffer.extend_from_slice(bytes);
            if let Some(path) = &session.pipe_dest {
                use std::io::Write;
                if let Ok(mut f) = std::fs::OpenOptions::new().create(true).append(true).open(path) {
                    let _ = f.write_all(bytes);
                }
            }
        }
    }

    /// Marks a session dead without a `kill_session` call, simulating a
    /// process that exited on its own.
    pub fn mark_exited(&self, name: &str) {
        if let Some(session) = self.sessions.lock().get_mut(name) {
            session.alive = false;
        }
    }

    pub fn sent_keys(&self, name: &str) -> Vec<String> {
        self.sessions
            .lock()
            .get(name)
            .map(|s| s.keys.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TerminalAdapter for FakeTerminalAdapter {
    async fn create_session(
        &self,
        name: &str,
        cwd: &Path,
        command: &str,
        env: &[(String, String)],
    ) -> Result<String, TerminalError> {
        let mut sessions = self.sessions.lock();
        if sessions.contains_key(name) {
            return Err(TerminalError::SpawnFailed(format!(
                "session already exists: {name}"
            )));
        }
        sessions.insert(
            name.to_string(),
            FakeSession {
                cwd: cwd.to_path_buf(),
                command: command.to_string(),
                env: env.to_vec(),
                keys: Vec::new(),
                alive: true,
                buffer: Vec::new(),
                pipe_dest: None,
            },
        );
        Ok(name.to_string())
    }

    async fn has_session(&self, name: &str) -> Result<bool, TerminalError> {
        Ok(self
            .sessions
            .lock()
            .get(name)
            .map(|s| s.alive)
            .unwrap_or(false))
    }

    async fn kill_session(&self, name: &str) -> Result<(), TerminalError> {
        if let Some(session) = self.sessions.lock().get_mut(name) {
            session.alive = false;
        }
        Ok(())
    }

    async fn send_keys(&self, name: &str, text: &str) -> Result<(), TerminalError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(name)
            .ok_or_else(|| TerminalError::NotFound(name.to_string()))?;
        if !session.alive {
            return Err(TerminalError::NotFound(name.to_string()));
        }
        session.keys.push(text.to_string());
        Ok(())
    }

    async fn resize_window(&self, _name: &str, _cols: u16, _rows: u16) -> Result<(), TerminalError> {
        Ok(())
    }

    async fn capture_pane(&self, name: &str) -> Result<Vec<u8>, TerminalError> {
        self.sessions
            .lock()
            .get(name)
            .map(|s| s.buffer.clone())
            .ok_or_else(|| TerminalError::NotFound(name.to_string()))
    }

    async fn pipe_output(&self, name: &str, dest: &Path) -> Result<(), TerminalError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(name)
            .ok_or_else(|| TerminalError::NotFound(name.to_string()))?;
        session.pipe_dest = Some(dest.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
