// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SessionManager`: the single mutator for session lifecycle operations.
//! Every public method is safe for concurrent use by many callers (CLI
//! invocations, the reconciler) and accepts a `CancellationToken` as its
//! cancellation handle.

use crate::error::{storage_err, terminal_err, workspace_err};
use crate::proxy_runtime::ProxyStatus;
use crate::state_manager::StateManager;
use amux_adapters::{EventSink, HookEvent, TerminalAdapter, TerminalError, WorkspaceStore};
use amux_core::{
    AmuxError, Clock, Config, IdGen, Identifier, ProjectLayout, Result, SessionEnvContext,
    SessionId, SessionInfo, Status, WorkspaceId, WorkspaceRecord,
};
use amux_storage::{IdMap, SessionStore, StateStore, WorkspaceRecordStore, WorkspaceSemaphore};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Input to `SessionManager::create_session`.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub session_id: Option<SessionId>,
    pub workspace_id: Option<WorkspaceId>,
    pub agent_id: String,
    pub command: Option<String>,
    pub environment: BTreeMap<String, String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub initial_prompt: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub agent_run_id: Option<String>,
}

/// In-process cache entry; avoids a disk read for callers that already
/// hold a fresh `SessionInfo` within the same process.
struct LiveSession {
    info: SessionInfo,
}

/// Result of `SessionManager::logs`: the caller decides how to render each
/// variant (print-once, stream a socket, or tail a file), since rendering
/// is a CLI/MCP concern, not the engine's.
pub enum LogHandle {
    /// `follow=false`: the newest run's `console.log`, read once.
    Snapshot(PathBuf),
    /// `follow=true` and the proxy accepted a live connection.
    Live(tokio::net::UnixStream),
    /// `follow=true` but the proxy's socket was unavailable; tail this
    /// file instead.
    FollowFile(PathBuf),
}

pub struct SessionManager {
    layout: ProjectLayout,
    config: Config,
    state_store: Arc<StateStore>,
    session_store: Arc<SessionStore>,
    workspace_records: Arc<WorkspaceRecordStore>,
    id_map: Arc<IdMap>,
    semaphore: Arc<WorkspaceSemaphore>,
    workspaces: Arc<dyn WorkspaceStore>,
    terminal: Arc<dyn TerminalAdapter>,
    hooks: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGen>,
    state_manager: StateManager,
    live: RwLock<HashMap<SessionId, Arc<LiveSession>>>,
    proxy_binary: PathBuf,
}

impl SessionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        layout: ProjectLayout,
        config: Config,
        state_store: Arc<StateStore>,
        session_store: Arc<SessionStore>,
        workspace_records: Arc<WorkspaceRecordStore>,
        id_map: Arc<IdMap>,
        semaphore: Arc<WorkspaceSemaphore>,
        workspaces: Arc<dyn WorkspaceStore>,
        terminal: Arc<dyn TerminalAdapter>,
        hooks: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGen>,
    ) -> Self {
        let state_manager = StateManager::new((*state_store).clone(), clock.clone());
        Self {
            layout,
            config,
            state_store,
            session_store,
            workspace_records,
            id_map,
            semaphore,
            workspaces,
            terminal,
            hooks,
            clock,
            id_gen,
            state_manager,
            live: RwLock::new(HashMap::new()),
            proxy_binary: find_proxy_binary(),
        }
    }

    /// Validates the workspace, allocates a `SessionId`, persists
    /// `SessionInfo` + an initial `created` state document, and caches a
    /// live handle. Never launches a process.
    pub async fn create_session(
        &self,
        opts: CreateOptions,
        cancel: &CancellationToken,
    ) -> Result<SessionInfo> {
        if cancel.is_cancelled() {
            return Err(AmuxError::Canceled);
        }

        let session_id = opts
            .session_id
            .clone()
            .unwrap_or_else(|| SessionId::new(self.id_gen.next()));

        let (workspace, auto_created_workspace) = match &opts.workspace_id {
            Some(id) => {
                let record = self
                    .workspace_records
                    .load(id.as_str())
                    .map_err(|_| AmuxError::NotFound(id.as_str().to_string()))?;
                (record, false)
            }
            None => {
                let workspace_id = WorkspaceId::new(self.id_gen.next());
                let name = format!("session-{}", session_id.short(8));
                let path = self.layout.workspace_dir(workspace_id.as_str());
                let branch = format!("amux/{name}");
                self.workspaces
                    .create(&path, &branch, "HEAD")
                    .await
                    .map_err(|e| workspace_err(workspace_id.as_str(), e))?;
                let record = WorkspaceRecord {
                    id: workspace_id,
                    name,
                    path,
                    branch: Some(branch),
                    auto_created: true,
                    created_at: self.clock.now(),
                };
                self.workspace_records
                    .save(&record)
                    .map_err(|e| storage_err(record.id.as_str(), e))?;
                (record, true)
            }
        };

        // Idempotent: an explicitly supplied workspace that's already
        // registered just returns its existing index.
        let _ = self.id_map.add_workspace(workspace.id.as_str());

        let agent_defaults = self.config.agents.get(&opts.agent_id).cloned();
        let mut environment = agent_defaults
            .as_ref()
            .map(|d| d.environment.clone())
            .unwrap_or_default();
        environment.extend(opts.environment);
        let command = opts
            .command
            .or_else(|| agent_defaults.map(|d| d.command))
            .unwrap_or_default();

        let info = SessionInfo {
            id: session_id.clone(),
            index: None,
            name: opts.name,
            description: opts.description,
            workspace_id: workspace.id.clone(),
            agent_id: opts.agent_id,
            command,
            environment,
            created_at: self.clock.now(),
            started_at: None,
            stopped_at: None,
            pid: None,
            terminal_session: None,
            storage_path: self.layout.session_dir(session_id.as_str()),
            auto_created_workspace,
            initial_prompt: opts.initial_prompt,
            error: String::new(),
            labels: opts.labels,
            agent_run_id: opts.agent_run_id,
        };

        self.state_store
            .save(
                session_id.as_str(),
                &amux_core::StateDocument::new(self.clock.now()),
            )
            .map_err(|e| storage_err(session_id.as_str(), e))?;
        self.session_store
            .save(&info)
            .map_err(|e| storage_err(session_id.as_str(), e))?;

        let index = self
            .id_map
            .add_session(session_id.as_str())
            .unwrap_or_else(|e| {
                tracing::warn!(session_id = %session_id, error = %e, "failed to allocate short index");
                String::new()
            });
        let mut info = info;
        info.index = if index.is_empty() { None } else { Some(index) };

        self.live.write().insert(
            session_id.clone(),
            Arc::new(LiveSession { info: info.clone() }),
        );

        Ok(info)
    }

    /// Transitions `created -> starting`, acquires the workspace, spawns
    /// the `OutputProxy`, and on success transitions `starting -> running`.
    pub async fn start(&self, identifier: &Identifier, cancel: &CancellationToken) -> Result<SessionInfo> {
        let session_id = self.resolve_session(identifier)?;
        let mut info = self.load_info(&session_id)?;

        // Checked before any transition is persisted: a missing multiplexer
        // binary must leave the session in `created`, not `failed`, since no
        // external resource was ever acquired.
        if let Err(TerminalError::Unavailable(msg)) = self.terminal.has_session(session_id.as_str()).await {
            return Err(AmuxError::TerminalUnavailable(msg));
        }

        let doc = self.state_manager.transition(&session_id, Status::Starting)?;
        if cancel.is_cancelled() {
            // No workspace claim was taken yet, so there is nothing to
            // release; but leaving the session in `starting` forever would
            // orphan it, since the reconciler treats transient states as
            // the manager's own business and never touches them.
            self.state_manager.transition(&session_id, Status::Failed)?;
            return Err(AmuxError::Canceled);
        }

        let workspace = self
            .workspace_records
            .load(info.workspace_id.as_str())
            .map_err(|e| storage_err(info.workspace_id.as_str(), e))?;
        self.semaphore
            .acquire(info.workspace_id.as_str(), session_id.as_str(), workspace.auto_created)
            .map_err(|e| storage_err(info.workspace_id.as_str(), e))?;

        let env_ctx = SessionEnvContext {
            session_id: session_id.clone(),
            session_index: info.index.clone(),
            agent_id: info.agent_id.clone(),
            session_name: info.name.clone(),
            session_description: info.description.clone(),
            workspace_id: workspace.id.clone(),
            workspace_name: workspace.name.clone(),
            workspace_path: workspace.path.clone(),
            workspace_branch: workspace.branch.clone(),
            project_root: self.layout.root.parent().map(PathBuf::from).unwrap_or_default(),
            config_dir: self.layout.root.clone(),
        };
        let mut env: Vec<(String, String)> = env_ctx.to_env_map(None).into_iter().collect();
        env.extend(info.environment.clone());

        match self.spawn_proxy(&session_id, doc.run_count, &workspace.path, &info.command, &env).await {
            Ok((pid, terminal_session)) => {
                info.started_at = Some(self.clock.now());
                info.pid = Some(pid);
                info.terminal_session = Some(terminal_session);
                self.session_store
                    .save(&info)
                    .map_err(|e| storage_err(session_id.as_str(), e))?;
                self.state_manager.transition(&session_id, Status::Running)?;

                if let Err(e) = self
                    .hooks
                    .emit(&HookEvent::new("session.start", env_ctx.to_env_map(Some("session.start"))))
                    .await
                {
                    tracing::warn!(session_id = %session_id, error = %e, "session.start hook failed");
                }

                if let Some(prompt) = info.initial_prompt.clone() {
                    let terminal = self.terminal.clone();
                    let target = info.terminal_session.clone().unwrap_or_default();
                    tokio::spawn(async move {
                        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                        if let Err(e) = terminal.send_keys(&target, &prompt).await {
                            tracing::warn!(error = %e, "failed to inject initial prompt");
                        }
                    });
                }
            }
            Err(e) => {
                self.state_manager.transition(&session_id, Status::Failed)?;
                self.semaphore
                    .release(info.workspace_id.as_str(), session_id.as_str())
                    .map_err(|se| storage_err(info.workspace_id.as_str(), se))?;
                return Err(e);
            }
        }

        self.refresh_cache(&session_id, info.clone());
        Ok(info)
    }

    /// Only valid from non-terminal states.
    pub async fn stop(
        &self,
        identifier: &Identifier,
        force_kill: bool,
        cancel: &CancellationToken,
    ) -> Result<SessionInfo> {
        let session_id = self.resolve_session(identifier)?;
        let mut info = self.load_info(&session_id)?;

        self.state_manager.transition(&session_id, Status::Stopping)?;

        let env_ctx_env: BTreeMap<String, String> = [
            (amux_core::env_vars::SESSION_ID.to_string(), session_id.as_str().to_string()),
            (amux_core::env_vars::EVENT.to_string(), "session.stop".to_string()),
        ]
        .into_iter()
        .collect();
        if let Err(e) = self.hooks.emit(&HookEvent::new("session.stop", env_ctx_env)).await {
            tracing::warn!(session_id = %session_id, error = %e, "session.stop hook failed");
        }

        if let Some(pid) = info.pid {
            if force_kill {
                signal_pid(pid, "-9");
            } else {
                signal_pid(pid, "-15");
                let deadline = self.clock.now() + chrono::Duration::from_std(self.config.stop_grace()).unwrap_or_default();
                while self.clock.now() < deadline && process_alive(pid) {
                    if cancel.is_cancelled() {
                        break;
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
                if process_alive(pid) {
                    signal_pid(pid, "-9");
                }
            }
        }

        if let Some(name) = info.terminal_session.clone() {
            let _ = self.terminal.kill_session(&name).await;
        }

        info.stopped_at = Some(self.clock.now());
        self.session_store
            .save(&info)
            .map_err(|e| storage_err(session_id.as_str(), e))?;
        self.state_manager.transition(&session_id, Status::Stopped)?;

        let (_, _) = self
            .semaphore
            .release(info.workspace_id.as_str(), session_id.as_str())
            .map_err(|e| storage_err(info.workspace_id.as_str(), e))?;

        self.refresh_cache(&session_id, info.clone());
        Ok(info)
    }

    /// Requires the session to be in a terminal state.
    pub async fn remove(
        &self,
        identifier: &Identifier,
        keep_workspace: bool,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        let session_id = self.resolve_session(identifier)?;
        let info = self.load_info(&session_id)?;
        let doc = self
            .state_store
            .load(session_id.as_str())
            .map_err(|e| storage_err(session_id.as_str(), e))?;
        if !doc.status.is_terminal() {
            return Err(AmuxError::SessionIsRunning(session_id.as_str().to_string()));
        }

        self.state_store
            .delete(session_id.as_str())
            .map_err(|e| storage_err(session_id.as_str(), e))?;
        let _ = self.id_map.remove_session(session_id.as_str());

        if !keep_workspace {
            let workspace = self
                .workspace_records
                .load(info.workspace_id.as_str())
                .map_err(|e| storage_err(info.workspace_id.as_str(), e))?;
            let remaining = self
                .semaphore
                .count(info.workspace_id.as_str())
                .map_err(|e| storage_err(info.workspace_id.as_str(), e))?;
            if workspace.auto_created && remaining == 0 {
                self.workspaces
                    .remove(&workspace.path)
                    .await
                    .map_err(|e| workspace_err(workspace.id.as_str(), e))?;
                self.workspace_records
                    .delete(workspace.id.as_str())
                    .map_err(|e| storage_err(workspace.id.as_str(), e))?;
                let _ = self.id_map.remove_workspace(workspace.id.as_str());
            }
        }

        self.live.write().remove(&session_id);
        Ok(())
    }

    /// Reads every session file, fills in short index from `IdMap`, and
    /// returns the live handle when cached.
    pub fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        let mut sessions = self
            .session_store
            .list()
            .map_err(|e| storage_err("*", e))?;
        for info in &mut sessions {
            if info.index.is_none() {
                info.index = self.id_map.get_session_short(info.id.as_str());
            }
        }
        Ok(sessions)
    }

    /// Full ID hit -> short-index lookup -> unique name match.
    pub fn resolve_session(&self, identifier: &Identifier) -> Result<SessionId> {
        let raw = identifier.raw();
        let sessions = self.session_store.list().map_err(|e| storage_err("*", e))?;

        amux_core::resolve(
            raw,
            |r| self.session_store.exists(r).then(|| SessionId::new(r)),
            |idx| self.id_map.get_session_full(idx).map(SessionId::new),
            |name| {
                sessions
                    .iter()
                    .filter(|s| s.name.as_deref() == Some(name))
                    .map(|s| s.id.clone())
                    .collect()
            },
        )
        .map_err(|candidates| {
            AmuxError::AmbiguousIdentifier(raw.to_string(), candidates.into_iter().map(|id| id.0).collect())
        })?
        .ok_or_else(|| AmuxError::NotFound(raw.to_string()))
    }

    /// Full ID hit -> short-index lookup -> unique name match, over
    /// workspace records rather than sessions. Symmetrical to
    /// `resolve_session`, since workspaces get the same three identifier
    /// forms a caller may type.
    pub fn resolve_workspace(&self, identifier: &Identifier) -> Result<WorkspaceId> {
        let raw = identifier.raw();
        let workspaces = self
            .workspace_records
            .list()
            .map_err(|e| storage_err("*", e))?;

        amux_core::resolve(
            raw,
            |r| self.workspace_records.exists(r).then(|| WorkspaceId::new(r)),
            |idx| self.id_map.get_workspace_full(idx).map(WorkspaceId::new),
            |name| {
                workspaces
                    .iter()
                    .filter(|w| w.name == name)
                    .map(|w| w.id.clone())
                    .collect()
            },
        )
        .map_err(|candidates| {
            AmuxError::AmbiguousIdentifier(raw.to_string(), candidates.into_iter().map(|id| id.0).collect())
        })?
        .ok_or_else(|| AmuxError::NotFound(raw.to_string()))
    }

    /// Returns a handle to the newest run's output. With
    /// `follow=false` the caller reads `console.log` once. With
    /// `follow=true` the manager first tries the proxy's live socket and
    /// only falls back to tailing the log file when the proxy is
    /// unavailable (e.g. it crashed but the log remains).
    pub async fn logs(&self, identifier: &Identifier, follow: bool) -> Result<LogHandle> {
        let session_id = self.resolve_session(identifier)?;
        let doc = self
            .state_store
            .load(session_id.as_str())
            .map_err(|e| storage_err(session_id.as_str(), e))?;
        let log_path = self.layout.console_log_path(session_id.as_str(), doc.run_count);

        if !follow {
            return Ok(LogHandle::Snapshot(log_path));
        }

        let socket_path = amux_core::socket_path(&std::env::temp_dir(), session_id.as_str());
        match tokio::net::UnixStream::connect(&socket_path).await {
            Ok(stream) => Ok(LogHandle::Live(stream)),
            Err(_) => Ok(LogHandle::FollowFile(log_path)),
        }
    }

    /// Only valid when `status.is_running()`.
    pub async fn send_input(&self, identifier: &Identifier, text: &str) -> Result<()> {
        let session_id = self.resolve_session(identifier)?;
        let info = self.load_info(&session_id)?;
        let doc = self
            .state_store
            .load(session_id.as_str())
            .map_err(|e| storage_err(session_id.as_str(), e))?;
        if !doc.status.is_running() {
            return Err(AmuxError::SessionNotRunning(session_id.as_str().to_string()));
        }
        let target = info
            .terminal_session
            .ok_or_else(|| AmuxError::SessionNotRunning(session_id.as_str().to_string()))?;
        self.terminal
            .send_keys(&target, text)
            .await
            .map_err(terminal_err)
    }

    fn load_info(&self, session_id: &SessionId) -> Result<SessionInfo> {
        if let Some(live) = self.live.read().get(session_id) {
            return Ok(live.info.clone());
        }
        self.session_store
            .load(session_id.as_str())
            .map_err(|e| storage_err(session_id.as_str(), e))
    }

    fn refresh_cache(&self, session_id: &SessionId, info: SessionInfo) {
        self.live
            .write()
            .insert(session_id.clone(), Arc::new(LiveSession { info }));
    }

    /// Spawns the detached `amux-proxy` process and waits for it to report
    /// back the terminal-backend session name it actually created. `run_id`
    /// is only this method's own prediction of where to look for that
    /// report: the proxy computes its real `run_id` itself (by scanning
    /// `--session-dir`), and is never told one over argv.
    async fn spawn_proxy(
        &self,
        session_id: &SessionId,
        run_id: u64,
        workspace_path: &std::path::Path,
        command: &str,
        env: &[(String, String)],
    ) -> Result<(u32, String)> {
        let session_dir = self.layout.session_dir(session_id.as_str());
        let status_path = self.layout.status_path(session_id.as_str(), run_id);
        let socket_path = amux_core::socket_path(&std::env::temp_dir(), session_id.as_str());

        let mut cmd = tokio::process::Command::new(&self.proxy_binary);
        cmd.arg("--session-dir").arg(&session_dir)
            .arg("--socket-path").arg(&socket_path)
            .arg("--ring-buffer-lines").arg(self.config.ring_buffer_lines.to_string())
            .arg("--status-refresh-secs").arg(self.config.status_refresh_secs.to_string())
            .arg("--")
            .arg(command);
        cmd.current_dir(workspace_path);
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());

        let child = cmd
            .spawn()
            .map_err(|e| AmuxError::ProxyLaunch(e.to_string()))?;
        let pid = child.id().ok_or_else(|| AmuxError::ProxyLaunch("proxy exited immediately".to_string()))?;
        // The proxy is detached and outlives this process; dropping the
        // handle here does not kill it (`tokio::process::Child` only kills
        // on drop when `kill_on_drop(true)` is set, which we don't set).
        drop(child);

        // The proxy alone knows the terminal-backend-specific session name it
        // ended up using (e.g. tmux's `amux-` prefix), so we read it back
        // from its status file rather than guessing at it here.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let terminal_session = loop {
            if let Ok(raw) = std::fs::read_to_string(&status_path) {
                if let Ok(status) = serde_yaml::from_str::<ProxyStatus>(&raw) {
                    break status.terminal_session;
                }
            }
            if std::time::Instant::now() > deadline {
                return Err(AmuxError::TerminalUnavailable(format!(
                    "proxy did not report a terminal session for {session_id}"
                )));
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        };

        Ok((pid, terminal_session))
    }
}

fn find_proxy_binary() -> PathBuf {
    if let Ok(path) = std::env::var("AMUX_PROXY_BIN") {
        return PathBuf::from(path);
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("amux-proxy");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("amux-proxy")
}

fn signal_pid(pid: u32, signal: &str) -> bool {
    std::process::Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn process_alive(pid: u32) -> bool {
    signal_pid(pid, "-0")
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
