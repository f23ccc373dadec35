use super::*;

#[tokio::test]
async fn create_then_has_session() {
    let adapter = FakeTerminalAdapter::new();
    adapter
        .create_session("s1", Path::new("/tmp"), "echo hi", &[])
        .await
        .unwrap();
    assert!(adapter.has_session("s1").await.unwrap());
}

#[tokio::test]
async fn duplicate_create_fails() {
    let adapter = FakeTerminalAdapter::new();
    adapter
        .create_session("s1", Path::new("/tmp"), "echo hi", &[])
        .await
        .unwrap();
    let err = adapter
        .create_session("s1", Path::new("/tmp"), "echo hi", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, TerminalError::SpawnFailed(_)));
}

#[tokio::test]
async fn send_keys_records_and_requires_live_session() {
    let adapter = FakeTerminalAdapter::new();
    adapter
        .create_session("s1", Path::new("/tmp"), "echo hi", &[])
        .await
        .unwrap();
    adapter.send_keys("s1", "hello").await.unwrap();
    assert_eq!(adapter.sent_keys("s1"), vec!["hello".to_string()]);

    adapter.kill_session("s1").await.unwrap();
    assert!(adapter.send_keys("s1", "again").await.is_err());
}

#[tokio::test]
async fn capture_pane_reflects_pushed_output() {
    let adapter = FakeTerminalAdapter::new();
    adapter
        .create_session("s1", Path::new("/tmp"), "echo hi", &[])
        .await
        .unwrap();
    adapter.push_output("s1", b"hello\n");
    assert_eq!(adapter.capture_pane("s1").await.unwrap(), b"hello\n");
}

#[tokio::test]
async fn unknown_session_not_found() {
    let adapter = FakeTerminalAdapter::new();
    assert!(adapter.capture_pane("missing").await.is_err());
}

#[tokio::test]
async fn pipe_output_mirrors_every_pushed_byte_past_capture_pane_window() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("pipe.raw");
    let adapter = FakeTerminalAdapter::new();
    adapter
        .create_session("s1", Path::new("/tmp"), "echo hi", &[])
        .await
        .unwrap();
    adapter.pipe_output("s1", &dest).await.unwrap();

    for i in 0..300 {
        adapter.push_output("s1", format!("line {i}\n").as_bytes());
    }

    let mirrored = std::fs::read_to_string(&dest).unwrap();
    assert_eq!(mirrored.lines().count(), 300);
    assert_eq!(mirrored.lines().next().unwrap(), "line 0");
    assert_eq!(mirrored.lines().last().unwrap(), "line 299");
}
