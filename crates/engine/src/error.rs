// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps the engine's collaborator error types onto the shared `AmuxError`
//! currency, so every public `SessionManager`/`Reconciler` operation
//! returns one error type regardless of which layer failed.

use amux_adapters::{HookError, TerminalError, WorkspaceError};
use amux_core::AmuxError;
use amux_storage::StorageError;

pub(crate) fn storage_err(context: impl Into<String>, e: StorageError) -> AmuxError {
    AmuxError::StateLoad(context.into(), e.to_string())
}

pub(crate) fn terminal_err(e: TerminalError) -> AmuxError {
    AmuxError::TerminalUnavailable(e.to_string())
}

pub(crate) fn workspace_err(workspace_id: impl Into<String>, e: WorkspaceError) -> AmuxError {
    AmuxError::WorkspaceBusy(workspace_id.into(), e.to_string())
}

pub(crate) fn hook_err(event: impl Into<String>, e: HookError) -> AmuxError {
    AmuxError::Hook(event.into(), e.to_string())
}
