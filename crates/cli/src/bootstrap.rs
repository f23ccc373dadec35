// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the concrete collaborators (`TmuxAdapter`, `GitWorktreeStore`,
//! hooks, clock, id generator) into a `SessionManager`/`Reconciler` pair
//! rooted at one project's `.amux/` directory. Kept separate from `main.rs`
//! so the wiring is a single, inspectable place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use amux_adapters::hooks::{CommandEventSink, EventSink, NoopEventSink};
use amux_adapters::session::TmuxAdapter;
use amux_adapters::workspace::GitWorktreeStore;
use amux_core::{Clock, Config, IdGen, ProjectLayout, SystemClock, UuidIdGen};
use amux_engine::{Reconciler, SessionManager};
use amux_storage::{IdMap, SessionStore, StateStore, WorkspaceRecordStore, WorkspaceSemaphore};
use anyhow::{Context, Result};

pub fn project_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot read current directory")?,
    };
    std::fs::canonicalize(&dir).with_context(|| format!("cannot resolve '{}'", dir.display()))
}

pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: Config,
    pub state_store: Arc<StateStore>,
    pub session_store: Arc<SessionStore>,
    pub workspace_records: Arc<WorkspaceRecordStore>,
    pub id_map: Arc<IdMap>,
    pub semaphore: Arc<WorkspaceSemaphore>,
    pub clock: Arc<dyn Clock>,
    pub id_gen: Arc<dyn IdGen>,
}

impl ProjectContext {
    pub fn load(root: &Path) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        std::fs::create_dir_all(layout.sessions_dir())
            .context("cannot create .amux/sessions directory")?;
        std::fs::create_dir_all(layout.workspaces_dir())
            .context("cannot create .amux/workspaces directory")?;
        let config = Config::load(&layout.root).context("cannot load .amux/config.yaml")?;
        let id_map =
            Arc::new(IdMap::open(layout.id_mappings_path()).context("cannot open id-mappings.yaml")?);

        Ok(Self {
            state_store: Arc::new(StateStore::new(layout.clone())),
            session_store: Arc::new(SessionStore::new(layout.clone())),
            workspace_records: Arc::new(WorkspaceRecordStore::new(layout.clone())),
            semaphore: Arc::new(WorkspaceSemaphore::new(layout.clone())),
            id_map,
            clock: Arc::new(SystemClock),
            id_gen: Arc::new(UuidIdGen),
            layout,
            config,
        })
    }

    fn hooks(&self) -> Arc<dyn EventSink> {
        if self.config.hooks.is_empty() {
            Arc::new(NoopEventSink)
        } else {
            Arc::new(CommandEventSink::new(self.config.hooks.clone()))
        }
    }

    pub fn session_manager(&self) -> SessionManager {
        SessionManager::new(
            self.layout.clone(),
            self.config.clone(),
            self.state_store.clone(),
            self.session_store.clone(),
            self.workspace_records.clone(),
            self.id_map.clone(),
            self.semaphore.clone(),
            Arc::new(GitWorktreeStore::new(self.layout.root.parent().unwrap_or(&self.layout.root))),
            Arc::new(TmuxAdapter::new()),
            self.hooks(),
            self.clock.clone(),
            self.id_gen.clone(),
        )
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            self.layout.clone(),
            self.session_store.clone(),
            self.workspace_records.clone(),
            self.id_map.clone(),
            self.semaphore.clone(),
            Arc::new(GitWorktreeStore::new(self.layout.root.parent().unwrap_or(&self.layout.root))),
            Arc::new(TmuxAdapter::new()),
            (*self.state_store).clone(),
            self.clock.clone(),
            self.config.idle_threshold(),
            self.config.reconcile_interval(),
        )
    }
}
