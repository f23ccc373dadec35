// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level integration tests covering end-to-end session lifecycle
//! scenarios, wiring `SessionManager` and `Reconciler` together against real
//! on-disk stores and fake external collaborators (no real tmux/git binary,
//! no spawned `amux-proxy` process).

use std::sync::Arc;
use std::time::Duration;

use amux_adapters::hooks::NoopEventSink;
use amux_adapters::session::FakeTerminalAdapter;
use amux_adapters::workspace::FakeWorkspaceStore;
use amux_core::test_support::SessionInfoBuilder;
use amux_core::{
    Clock, Config, FakeClock, Identifier, IdGen, ProjectLayout, SequentialIdGen, Status,
    WorkspaceId, WorkspaceRecord,
};
use amux_engine::reconciler::ReconcileOutcome;
use amux_engine::{CreateOptions, Reconciler, SessionManager};
use amux_storage::{IdMap, SessionStore, StateStore, WorkspaceRecordStore, WorkspaceSemaphore};
use chrono::Utc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Harness {
    _dir: TempDir,
    layout: ProjectLayout,
    manager: SessionManager,
    reconciler: Reconciler,
    terminal: Arc<FakeTerminalAdapter>,
    workspace_records: Arc<WorkspaceRecordStore>,
    semaphore: Arc<WorkspaceSemaphore>,
    session_store: Arc<SessionStore>,
    clock: Arc<FakeClock>,
}

fn harness() -> Harness {
    let dir = TempDir::new().unwrap();
    let layout = ProjectLayout::new(dir.path());
    let config = Config::default();
    let state_store = Arc::new(StateStore::new(layout.clone()));
    let session_store = Arc::new(SessionStore::new(layout.clone()));
    let workspace_records = Arc::new(WorkspaceRecordStore::new(layout.clone()));
    let id_map = Arc::new(IdMap::open(layout.id_mappings_path()).unwrap());
    let semaphore = Arc::new(WorkspaceSemaphore::new(layout.clone()));
    let workspaces: Arc<dyn amux_adapters::WorkspaceStore> = Arc::new(FakeWorkspaceStore::new());
    let terminal = Arc::new(FakeTerminalAdapter::new());
    let clock = Arc::new(FakeClock::new(Utc::now()));
    let id_gen: Arc<dyn IdGen> = Arc::new(SequentialIdGen::new("s"));

    let manager = SessionManager::new(
        layout.clone(),
        config,
        state_store.clone(),
        session_store.clone(),
        workspace_records.clone(),
        id_map.clone(),
        semaphore.clone(),
        workspaces.clone(),
        terminal.clone(),
        Arc::new(NoopEventSink),
        clock.clone() as Arc<dyn Clock>,
        id_gen,
    );

    let reconciler = Reconciler::new(
        layout.clone(),
        session_store.clone(),
        workspace_records.clone(),
        id_map,
        semaphore.clone(),
        workspaces,
        terminal.clone(),
        (*state_store).clone(),
        clock.clone() as Arc<dyn Clock>,
        Duration::from_secs(5),
        Duration::from_millis(50),
    );

    Harness {
        _dir: dir,
        layout,
        manager,
        reconciler,
        terminal,
        workspace_records,
        semaphore,
        session_store,
        clock,
    }
}

fn create_opts() -> CreateOptions {
    CreateOptions {
        agent_id: "claude".to_string(),
        command: Some("echo hi".to_string()),
        ..Default::default()
    }
}

/// Drives a session through `created -> starting -> running` without
/// spawning the real proxy binary, standing in for `SessionManager::start`
/// for scenarios that only care about what happens once a session is live.
async fn simulate_start(h: &Harness, session_id: &amux_core::SessionId, workspace_id: &str, terminal_name: &str) {
    h.terminal
        .create_session(terminal_name, &h.layout.root, "echo hi", &[])
        .await
        .unwrap();
    let mut info = h.session_store.load(session_id.as_str()).unwrap();
    info.terminal_session = Some(terminal_name.to_string());
    info.started_at = Some(h.clock.now());
    h.session_store.save(&info).unwrap();
    h.semaphore.acquire(workspace_id, session_id.as_str(), info.auto_created_workspace).unwrap();

    // Transition through the same path Start() would, without its process spawn.
    let state_store = StateStore::new(h.layout.clone());
    let mut doc = state_store.load(session_id.as_str()).unwrap();
    doc.status = Status::Starting;
    doc.run_count += 1;
    state_store.save(session_id.as_str(), &doc).unwrap();
    doc.status = Status::Running;
    doc.last_output_time = Some(h.clock.now());
    state_store.save(session_id.as_str(), &doc).unwrap();
}

#[tokio::test]
async fn create_start_idle_stop_remove_manual_workspace() {
    let h = harness();
    let cancel = CancellationToken::new();

    let workspace_id = WorkspaceId::new("w1");
    h.workspace_records
        .save(&WorkspaceRecord {
            id: workspace_id.clone(),
            name: "w1".to_string(),
            path: h.layout.root.join("w1"),
            branch: None,
            auto_created: false,
            created_at: h.clock.now(),
        })
        .unwrap();

    let mut opts = create_opts();
    opts.workspace_id = Some(workspace_id.clone());
    let info = h.manager.create_session(opts, &cancel).await.unwrap();
    assert_eq!(info.index.as_deref(), Some("1"));

    simulate_start(&h, &info.id, workspace_id.as_str(), "amux-s1").await;
    let doc = h.manager.list_sessions().unwrap();
    assert!(doc.iter().any(|s| s.id == info.id));

    // No new output for longer than the idle threshold: reconciler marks idle.
    h.clock.advance(chrono::Duration::seconds(10));
    let reloaded = h.session_store.load(info.id.as_str()).unwrap();
    let outcome = h.reconciler.reconcile_session(&reloaded).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::MarkedIdle);

    let identifier = Identifier::parse(info.id.as_str());
    h.manager.stop(&identifier, false, &cancel).await.unwrap();
    let stopped = h.session_store.load(info.id.as_str()).unwrap();
    assert!(stopped.stopped_at.is_some());

    h.manager.remove(&identifier, false, &cancel).await.unwrap();
    assert!(h.workspace_records.load(workspace_id.as_str()).is_ok());
}

#[tokio::test]
async fn auto_workspace_is_removed_after_stop_and_remove() {
    let h = harness();
    let cancel = CancellationToken::new();

    let info = h.manager.create_session(create_opts(), &cancel).await.unwrap();
    assert!(info.auto_created_workspace);

    simulate_start(&h, &info.id, info.workspace_id.as_str(), "amux-s2").await;
    let identifier = Identifier::parse(info.id.as_str());
    h.manager.stop(&identifier, false, &cancel).await.unwrap();
    h.manager.remove(&identifier, false, &cancel).await.unwrap();

    assert!(h.workspace_records.load(info.workspace_id.as_str()).is_err());
}

#[tokio::test]
async fn ref_counted_workspace_survives_until_last_holder_removed() {
    let h = harness();
    let cancel = CancellationToken::new();

    let a = h.manager.create_session(create_opts(), &cancel).await.unwrap();
    let mut opts_b = create_opts();
    opts_b.workspace_id = Some(a.workspace_id.clone());
    let b = h.manager.create_session(opts_b, &cancel).await.unwrap();

    simulate_start(&h, &a.id, a.workspace_id.as_str(), "amux-a").await;
    simulate_start(&h, &b.id, b.workspace_id.as_str(), "amux-b").await;

    let id_a = Identifier::parse(a.id.as_str());
    let id_b = Identifier::parse(b.id.as_str());
    h.manager.stop(&id_a, false, &cancel).await.unwrap();
    h.manager.remove(&id_a, false, &cancel).await.unwrap();
    assert!(h.workspace_records.load(a.workspace_id.as_str()).is_ok());

    h.manager.stop(&id_b, false, &cancel).await.unwrap();
    h.manager.remove(&id_b, false, &cancel).await.unwrap();
    assert!(h.workspace_records.load(b.workspace_id.as_str()).is_err());
}

#[tokio::test]
async fn orphan_reconciliation_fails_and_releases_workspace() {
    let h = harness();
    let cancel = CancellationToken::new();

    let info = h.manager.create_session(create_opts(), &cancel).await.unwrap();
    simulate_start(&h, &info.id, info.workspace_id.as_str(), "amux-s3").await;

    // Out-of-band kill: the terminal session vanishes without going through Stop.
    h.terminal.kill_session("amux-s3").await.unwrap();

    let reloaded = h.session_store.load(info.id.as_str()).unwrap();
    let outcome = h.reconciler.reconcile_session(&reloaded).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Orphaned);

    let state_store = StateStore::new(h.layout.clone());
    let doc = state_store.load(info.id.as_str()).unwrap();
    assert_eq!(doc.status, Status::Failed);
    assert_eq!(h.semaphore.count(info.workspace_id.as_str()).unwrap(), 0);
}

#[tokio::test]
async fn ambiguous_name_resolves_by_index_instead() {
    let h = harness();
    let cancel = CancellationToken::new();

    let mut a = create_opts();
    a.name = Some("build".to_string());
    let mut b = create_opts();
    b.name = Some("build".to_string());
    let a = h.manager.create_session(a, &cancel).await.unwrap();
    let _b = h.manager.create_session(b, &cancel).await.unwrap();

    let err = h.manager.resolve_session(&Identifier::parse("build")).unwrap_err();
    assert_eq!(err.kind(), "ambiguous_identifier");

    let resolved = h.manager.resolve_session(&Identifier::parse("1")).unwrap();
    assert_eq!(resolved, a.id);
}
