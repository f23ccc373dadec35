// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook event sink: runs the configured shell command for a
//! lifecycle event (`session.start`, `session.stop`, ...) with the
//! `AMUX_*` environment variables from `SessionEnvContext` applied. Hook
//! failures are reported as warnings; they never abort the operation that
//! triggered them.

mod command;
mod noop;

pub use command::CommandEventSink;
pub use noop::NoopEventSink;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEventSink;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook command failed to spawn: {0}")]
    SpawnFailed(String),
    #[error("hook command exited with status {0}")]
    NonZeroExit(i32),
}

/// One emitted lifecycle event and the environment it carries.
#[derive(Debug, Clone)]
pub struct HookEvent {
    pub name: String,
    pub env: BTreeMap<String, String>,
}

impl HookEvent {
    pub fn new(name: impl Into<String>, env: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            env,
        }
    }
}

/// Sink for lifecycle events. Implementations decide how (or whether) to
/// act on an event; `SessionManager` and `StateManager` call `emit` and log
/// but never fail an operation because a hook failed.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &HookEvent) -> Result<(), HookError>;
}
