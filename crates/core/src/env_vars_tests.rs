use super::*;
use std::path::PathBuf;

fn sample_ctx() -> SessionEnvContext {
    SessionEnvContext {
        session_id: SessionId::new("s1"),
        session_index: Some("1".into()),
        agent_id: "claude".into(),
        session_name: Some("build".into()),
        session_description: None,
        workspace_id: WorkspaceId::new("w1"),
        workspace_name: "w1".into(),
        workspace_path: PathBuf::from("/tmp/w1"),
        workspace_branch: Some("main".into()),
        project_root: PathBuf::from("/tmp/proj"),
        config_dir: PathBuf::from("/tmp/proj/.amux"),
    }
}

#[test]
fn env_map_carries_every_documented_variable() {
    let env = sample_ctx().to_env_map(None);
    assert_eq!(env.get(SESSION_ID).unwrap(), "s1");
    assert_eq!(env.get(SESSION_INDEX).unwrap(), "1");
    assert_eq!(env.get(AGENT_ID).unwrap(), "claude");
    assert_eq!(env.get(SESSION_NAME).unwrap(), "build");
    assert_eq!(env.get(WORKSPACE_ID).unwrap(), "w1");
    assert_eq!(env.get(WORKSPACE_PATH).unwrap(), "/tmp/w1");
    assert_eq!(env.get(WORKSPACE_BRANCH).unwrap(), "main");
    assert_eq!(env.get(PROJECT_ROOT).unwrap(), "/tmp/proj");
    assert!(!env.contains_key(EVENT));
}

#[test]
fn env_map_includes_event_only_for_hooks() {
    let env = sample_ctx().to_env_map(Some("session.start"));
    assert_eq!(env.get(EVENT).unwrap(), "session.start");
}

#[test]
fn env_map_omits_optional_fields_when_absent() {
    let mut ctx = sample_ctx();
    ctx.session_index = None;
    ctx.session_description = None;
    ctx.workspace_branch = None;
    let env = ctx.to_env_map(None);
    assert!(!env.contains_key(SESSION_INDEX));
    assert!(!env.contains_key(SESSION_DESCRIPTION));
    assert!(!env.contains_key(WORKSPACE_BRANCH));
}
