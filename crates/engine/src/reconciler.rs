// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background sweeper that reconciles declared session state against
//! observable facts: does the terminal-multiplexer session still exist,
//! did the proxy record an exit, has output gone quiet long enough to call
//! the session idle.

use crate::error::{storage_err, workspace_err};
use crate::state_manager::StateManager;
use amux_adapters::{TerminalAdapter, WorkspaceStore};
use amux_core::{Clock, ProjectLayout, SessionId, SessionInfo, Status};
use amux_storage::{IdMap, SessionStore, StateStore, WorkspaceRecordStore, WorkspaceSemaphore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One sweep's outcome for a single session, returned to tests and to
/// callers that want to log what happened without re-deriving it from
/// disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing needed doing (terminal status, or a transient pre-launch
    /// status with no terminal session to check yet).
    Unchanged,
    /// New output observed; `record_output` may have promoted idle/running
    /// into working.
    OutputRecorded,
    /// Silence exceeded the idle threshold; transitioned to `idle`.
    MarkedIdle,
    /// The proxy recorded an exit; adopted into `completed` or `failed`.
    AdoptedExit,
    /// The terminal session vanished out-of-band; transitioned through
    /// `orphaned` into `failed`.
    Orphaned,
}

/// Sweeps every known session at a fixed cadence, applying exactly the
/// four orphan-handling rules through `StateManager`.
pub struct Reconciler {
    layout: ProjectLayout,
    session_store: Arc<SessionStore>,
    workspace_records: Arc<WorkspaceRecordStore>,
    id_map: Arc<IdMap>,
    semaphore: Arc<WorkspaceSemaphore>,
    workspaces: Arc<dyn WorkspaceStore>,
    terminal: Arc<dyn TerminalAdapter>,
    state_manager: StateManager,
    clock: Arc<dyn Clock>,
    idle_threshold: Duration,
    interval: Duration,
}

impl Reconciler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        layout: ProjectLayout,
        session_store: Arc<SessionStore>,
        workspace_records: Arc<WorkspaceRecordStore>,
        id_map: Arc<IdMap>,
        semaphore: Arc<WorkspaceSemaphore>,
        workspaces: Arc<dyn WorkspaceStore>,
        terminal: Arc<dyn TerminalAdapter>,
        state_store: StateStore,
        clock: Arc<dyn Clock>,
        idle_threshold: Duration,
        interval: Duration,
    ) -> Self {
        let state_manager = StateManager::new(state_store, clock.clone());
        Self {
            layout,
            session_store,
            workspace_records,
            id_map,
            semaphore,
            workspaces,
            terminal,
            state_manager,
            clock,
            idle_threshold,
            interval,
        }
    }

    /// Runs until `cancel` fires, sweeping every known session once per
    /// tick at a fixed cadence.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    self.sweep().await;
                }
            }
        }
    }

    /// One full pass over every session currently on disk.
    pub async fn sweep(&self) {
        let sessions = match self.session_store.list() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(error = %e, "reconciler failed to list sessions");
                return;
            }
        };
        for session in &sessions {
            if let Err(e) = self.reconcile_session(session).await {
                tracing::warn!(session_id = %session.id, error = %e, "reconcile failed");
            }
        }
    }

    /// Applies the four orphan-handling rules to one session, in order:
    /// exit adoption, orphan detection, output recording (idle->working),
    /// idle-threshold demotion.
    pub async fn reconcile_session(
        &self,
        session: &SessionInfo,
    ) -> amux_core::Result<ReconcileOutcome> {
        let doc = self.state_manager.load(&session.id)?;
        if doc.status.is_terminal() {
            return Ok(ReconcileOutcome::Unchanged);
        }
        if !matches!(
            doc.status,
            Status::Running | Status::Working | Status::Idle
        ) {
            // Created/Starting/Stopping are transient states the manager
            // itself drives; the reconciler has nothing observable to
            // check until a terminal session exists.
            return Ok(ReconcileOutcome::Unchanged);
        }
        let Some(terminal_name) = session.terminal_session.as_deref() else {
            return Ok(ReconcileOutcome::Unchanged);
        };

        if let Some(proxy_status) = self.read_proxy_status(session.id.as_str(), doc.run_count) {
            if proxy_status.status == crate::proxy_runtime::ProxyRunState::Exited {
                let next = match proxy_status.exit_code {
                    Some(0) => Status::Completed,
                    _ => Status::Failed,
                };
                self.state_manager.transition(&session.id, next)?;
                self.release_workspace(session).await?;
                return Ok(ReconcileOutcome::AdoptedExit);
            }
        }

        if !self.terminal.has_session(terminal_name).await.unwrap_or(false) {
            // Orphaned is reached and immediately superseded by Failed in
            // the same sweep -- see DESIGN.md for why Orphaned still carries
            // one outgoing edge despite otherwise being a terminal status.
            self.state_manager.transition(&session.id, Status::Orphaned)?;
            self.state_manager.transition(&session.id, Status::Failed)?;
            self.release_workspace(session).await?;
            return Ok(ReconcileOutcome::Orphaned);
        }

        let mut outcome = ReconcileOutcome::Unchanged;
        if let Ok(pane) = self.terminal.capture_pane(terminal_name).await {
            let before = self.state_manager.load(&session.id)?;
            let after = self.state_manager.record_output(&session.id, &pane)?;
            if after.last_output_time != before.last_output_time {
                outcome = ReconcileOutcome::OutputRecorded;
            }
        }

        let doc = self.state_manager.load(&session.id)?;
        if matches!(doc.status, Status::Running | Status::Working) {
            if let Some(last) = doc.last_output_time {
                let idle_for = self.clock.now() - last;
                if idle_for
                    > chrono::Duration::from_std(self.idle_threshold).unwrap_or(chrono::Duration::zero())
                {
                    self.state_manager.transition(&session.id, Status::Idle)?;
                    outcome = ReconcileOutcome::MarkedIdle;
                }
            }
        }

        self.state_manager.mark_checked(&session.id)?;
        Ok(outcome)
    }

    fn read_proxy_status(
        &self,
        session_id: &str,
        run_id: u64,
    ) -> Option<crate::proxy_runtime::ProxyStatus> {
        let path = self.layout.status_path(session_id, run_id);
        read_proxy_status_file(&path)
    }

    async fn release_workspace(&self, session: &SessionInfo) -> amux_core::Result<()> {
        let (count, auto_created) = self
            .semaphore
            .release(session.workspace_id.as_str(), session.id.as_str())
            .map_err(|e| storage_err(session.workspace_id.as_str(), e))?;
        if auto_created && count == 0 {
            if let Ok(record) = self.workspace_records.load(session.workspace_id.as_str()) {
                self.workspaces
                    .remove(&record.path)
                    .await
                    .map_err(|e| workspace_err(record.id.as_str(), e))?;
                let _ = self.workspace_records.delete(record.id.as_str());
                let _ = self.id_map.remove_workspace(record.id.as_str());
            }
        }
        Ok(())
    }
}

fn read_proxy_status_file(path: &Path) -> Option<crate::proxy_runtime::ProxyStatus> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&raw).ok()
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
