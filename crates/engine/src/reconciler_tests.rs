use super::*;
use amux_adapters::session::FakeTerminalAdapter;
use amux_adapters::workspace::FakeWorkspaceStore;
use amux_core::test_support::SessionInfoBuilder;
use amux_core::{FakeClock, StateDocument};
use amux_storage::IdMap;
use chrono::Utc;
use tempfile::tempdir;

struct Fixture {
    reconciler: Reconciler,
    session_store: Arc<SessionStore>,
    state_store: StateStore,
    semaphore: Arc<WorkspaceSemaphore>,
    terminal: Arc<FakeTerminalAdapter>,
    clock: Arc<FakeClock>,
}

fn fixture(root: &std::path::Path, idle_threshold: Duration) -> Fixture {
    let layout = ProjectLayout::new(root);
    let session_store = Arc::new(SessionStore::new(layout.clone()));
    let workspace_records = Arc::new(WorkspaceRecordStore::new(layout.clone()));
    let semaphore = Arc::new(WorkspaceSemaphore::new(layout.clone()));
    let workspaces: Arc<dyn WorkspaceStore> = Arc::new(FakeWorkspaceStore::new());
    let terminal = Arc::new(FakeTerminalAdapter::new());
    let state_store = StateStore::new(layout.clone());
    let clock = Arc::new(FakeClock::new(Utc::now()));
    let id_map = Arc::new(IdMap::open(layout.id_mappings_path()).unwrap());

    let reconciler = Reconciler::new(
        layout,
        session_store.clone(),
        workspace_records,
        id_map,
        semaphore.clone(),
        workspaces,
        terminal.clone(),
        state_store.clone(),
        clock.clone(),
        idle_threshold,
        Duration::from_millis(50),
    );

    Fixture {
        reconciler,
        session_store,
        state_store,
        semaphore,
        terminal,
        clock,
    }
}

fn seed_running_session(fx: &Fixture, id: &str, workspace_id: &str, terminal_name: &str) -> SessionInfo {
    let mut info = SessionInfoBuilder::new(id, workspace_id).build();
    info.terminal_session = Some(terminal_name.to_string());
    info.started_at = Some(Utc::now());
    fx.session_store.save(&info).unwrap();

    let mut doc = StateDocument::new(fx.clock.now());
    doc.status = Status::Running;
    doc.last_output_time = Some(fx.clock.now());
    fx.state_store.save(id, &doc).unwrap();
    fx.semaphore.acquire(workspace_id, id, true).unwrap();
    info
}

#[tokio::test]
async fn orphaned_session_becomes_orphaned_then_failed_and_releases_workspace() {
    let dir = tempdir().unwrap();
    let fx = fixture(dir.path(), Duration::from_secs(30));
    let info = seed_running_session(&fx, "s1", "w1", "amux-s1");
    // Terminal session was never created on the fake adapter, so has_session is false.

    let outcome = fx.reconciler.reconcile_session(&info).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Orphaned);

    let doc = fx.state_store.load("s1").unwrap();
    assert_eq!(doc.status, Status::Failed);
    assert_eq!(fx.semaphore.count("w1").unwrap(), 0);
}

#[tokio::test]
async fn exited_zero_adopts_completed() {
    let dir = tempdir().unwrap();
    let fx = fixture(dir.path(), Duration::from_secs(30));
    let info = seed_running_session(&fx, "s1", "w1", "amux-s1");
    fx.terminal
        .create_session("amux-s1", dir.path(), "echo hi", &[])
        .await
        .unwrap();

    let layout = ProjectLayout::new(dir.path());
    let status_path = layout.status_path("s1", 0);
    std::fs::create_dir_all(status_path.parent().unwrap()).unwrap();
    amux_storage::atomic::atomic_write_yaml(
        &status_path,
        &crate::proxy_runtime::ProxyStatus {
            run_id: 0,
            pid: 123,
            status: crate::proxy_runtime::ProxyRunState::Exited,
            terminal_session: "amux-s1".to_string(),
            exit_code: Some(0),
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
        },
    )
    .unwrap();

    let outcome = fx.reconciler.reconcile_session(&info).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::AdoptedExit);
    let doc = fx.state_store.load("s1").unwrap();
    assert_eq!(doc.status, Status::Completed);
}

#[tokio::test]
async fn exited_nonzero_adopts_failed() {
    let dir = tempdir().unwrap();
    let fx = fixture(dir.path(), Duration::from_secs(30));
    let info = seed_running_session(&fx, "s1", "w1", "amux-s1");
    fx.terminal
        .create_session("amux-s1", dir.path(), "false", &[])
        .await
        .unwrap();

    let layout = ProjectLayout::new(dir.path());
    let status_path = layout.status_path("s1", 0);
    amux_storage::atomic::atomic_write_yaml(
        &status_path,
        &crate::proxy_runtime::ProxyStatus {
            run_id: 0,
            pid: 123,
            status: crate::proxy_runtime::ProxyRunState::Exited,
            terminal_session: "amux-s1".to_string(),
            exit_code: Some(1),
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
        },
    )
    .unwrap();

    let outcome = fx.reconciler.reconcile_session(&info).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::AdoptedExit);
    let doc = fx.state_store.load("s1").unwrap();
    assert_eq!(doc.status, Status::Failed);
}

#[tokio::test]
async fn silence_past_threshold_marks_idle() {
    let dir = tempdir().unwrap();
    let fx = fixture(dir.path(), Duration::from_secs(5));
    let info = seed_running_session(&fx, "s1", "w1", "amux-s1");
    fx.terminal
        .create_session("amux-s1", dir.path(), "sleep 100", &[])
        .await
        .unwrap();

    fx.clock.advance(chrono::Duration::seconds(10));

    let outcome = fx.reconciler.reconcile_session(&info).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::MarkedIdle);
    let doc = fx.state_store.load("s1").unwrap();
    assert_eq!(doc.status, Status::Idle);
}

#[tokio::test]
async fn fresh_output_promotes_idle_back_to_working() {
    let dir = tempdir().unwrap();
    let fx = fixture(dir.path(), Duration::from_secs(5));
    let info = seed_running_session(&fx, "s1", "w1", "amux-s1");
    fx.terminal
        .create_session("amux-s1", dir.path(), "sleep 100", &[])
        .await
        .unwrap();

    let mut doc = fx.state_store.load("s1").unwrap();
    doc.status = Status::Idle;
    fx.state_store.save("s1", &doc).unwrap();

    fx.terminal.push_output("amux-s1", b"new output\n");
    let outcome = fx.reconciler.reconcile_session(&info).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::OutputRecorded);
    let doc = fx.state_store.load("s1").unwrap();
    assert_eq!(doc.status, Status::Working);
}

#[tokio::test]
async fn terminal_session_is_left_alone() {
    let dir = tempdir().unwrap();
    let fx = fixture(dir.path(), Duration::from_secs(30));
    let mut info = SessionInfoBuilder::new("s1", "w1").build();
    info.terminal_session = Some("amux-s1".to_string());
    fx.session_store.save(&info).unwrap();
    let mut doc = StateDocument::new(fx.clock.now());
    doc.status = Status::Stopped;
    fx.state_store.save("s1", &doc).unwrap();

    let outcome = fx.reconciler.reconcile_session(&info).await.unwrap();
    assert_eq!(outcome, ReconcileOutcome::Unchanged);
}
