// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{EventSink, HookError, HookEvent};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::process::Command;

/// Runs a configured shell command per hook name (`config.yaml`'s `hooks`
/// map). Events with no configured command are a silent no-op.
#[derive(Debug, Clone, Default)]
pub struct CommandEventSink {
    commands: BTreeMap<String, String>,
}

impl CommandEventSink {
    pub fn new(commands: BTreeMap<String, String>) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl EventSink for CommandEventSink {
    async fn emit(&self, event: &HookEvent) -> Result<(), HookError> {
        let Some(command) = self.commands.get(&event.name) else {
            return Ok(());
        };

        tracing::info!(event = %event.name, command = %command, "running hook");

        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .envs(&event.env)
            .output()
            .await
            .map_err(|e| HookError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                event = %event.name,
                status = ?output.status.code(),
                stderr = %stderr,
                "hook command exited non-zero"
            );
            return Err(HookError::NonZeroExit(output.status.code().unwrap_or(-1)));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
