// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured error kinds shared across the workspace.

use crate::status::Status;
use thiserror::Error;

/// A single error-kind enumeration carried alongside context; no in-band
/// sentinel values. The CLI/MCP layer maps each variant to an exit code.
#[derive(Debug, Error)]
pub enum AmuxError {
    #[error("no session or workspace matches {0:?}")]
    NotFound(String),

    #[error("{0:?} matches more than one entity by name: {1:?}")]
    AmbiguousIdentifier(String, Vec<String>),

    #[error("cannot transition from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },

    #[error("session {0} is still running; stop it before removing")]
    SessionIsRunning(String),

    #[error("session {0} is not running")]
    SessionNotRunning(String),

    #[error("terminal multiplexer unavailable: {0}")]
    TerminalUnavailable(String),

    #[error("workspace {0} is busy: {1}")]
    WorkspaceBusy(String, String),

    #[error("failed to load state for {0}: {1}")]
    StateLoad(String, String),

    #[error("failed to launch output proxy: {0}")]
    ProxyLaunch(String),

    #[error("hook {0} failed: {1}")]
    Hook(String, String),

    #[error("operation timed out")]
    Timeout,

    #[error("operation canceled")]
    Canceled,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl AmuxError {
    /// Stable short name for the error kind, used by callers that want to
    /// match on kind without matching the whole enum (e.g. CLI exit-code
    /// mapping, test assertions).
    pub fn kind(&self) -> &'static str {
        match self {
            AmuxError::NotFound(_) => "not_found",
            AmuxError::AmbiguousIdentifier(..) => "ambiguous_identifier",
            AmuxError::InvalidTransition { .. } => "invalid_transition",
            AmuxError::SessionIsRunning(_) => "session_is_running",
            AmuxError::SessionNotRunning(_) => "session_not_running",
            AmuxError::TerminalUnavailable(_) => "terminal_unavailable",
            AmuxError::WorkspaceBusy(..) => "workspace_busy",
            AmuxError::StateLoad(..) => "state_load_error",
            AmuxError::ProxyLaunch(_) => "proxy_launch_error",
            AmuxError::Hook(..) => "hook_error",
            AmuxError::Timeout => "timeout",
            AmuxError::Canceled => "canceled",
            AmuxError::Io(_) => "io_error",
        }
    }

    /// Exit code mapping for a non-zero, descriptive CLI failure. The CLI
    /// facade itself is out of scope for this crate; this mapping is
    /// provided for whichever real CLI consumes `AmuxError`.
    pub fn exit_code(&self) -> i32 {
        match self {
            AmuxError::NotFound(_) => 10,
            AmuxError::AmbiguousIdentifier(..) => 11,
            AmuxError::InvalidTransition { .. } => 12,
            AmuxError::SessionIsRunning(_) => 13,
            AmuxError::SessionNotRunning(_) => 14,
            AmuxError::TerminalUnavailable(_) => 15,
            AmuxError::WorkspaceBusy(..) => 16,
            AmuxError::StateLoad(..) => 17,
            AmuxError::ProxyLaunch(_) => 18,
            AmuxError::Hook(..) => 19,
            AmuxError::Timeout | AmuxError::Canceled => 20,
            AmuxError::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AmuxError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
