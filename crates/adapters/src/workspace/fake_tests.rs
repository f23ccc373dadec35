use super::*;

#[tokio::test]
async fn create_then_is_worktree() {
    let dir = tempfile::tempdir().unwrap();
    let store = FakeWorkspaceStore::new();
    let path = dir.path().join("ws1");
    store.create(&path, "amux/s1", "HEAD").await.unwrap();
    assert!(store.is_worktree(&path).await.unwrap());
}

#[tokio::test]
async fn remove_clears_worktree_and_directory() {
    let dir = tempfile::tempdir().unwrap();
    let store = FakeWorkspaceStore::new();
    let path = dir.path().join("ws1");
    store.create(&path, "amux/s1", "HEAD").await.unwrap();
    store.remove(&path).await.unwrap();
    assert!(!store.is_worktree(&path).await.unwrap());
    assert!(!path.exists());
}
