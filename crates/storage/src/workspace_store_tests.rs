use super::*;
use amux_core::{ProjectLayout, WorkspaceId};
use chrono::Utc;
use tempfile::tempdir;

fn record(id: &str) -> WorkspaceRecord {
    WorkspaceRecord {
        id: WorkspaceId::new(id),
        name: format!("session-{id}"),
        path: std::path::PathBuf::from(format!("/tmp/amux-{id}")),
        branch: Some(format!("amux/{id}")),
        auto_created: true,
        created_at: Utc::now(),
    }
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let store = WorkspaceRecordStore::new(ProjectLayout::new(dir.path()));
    let saved = record("w1");
    store.save(&saved).unwrap();
    let loaded = store.load("w1").unwrap();
    assert_eq!(loaded, saved);
}

#[test]
fn load_missing_is_not_found() {
    let dir = tempdir().unwrap();
    let store = WorkspaceRecordStore::new(ProjectLayout::new(dir.path()));
    assert!(matches!(store.load("missing"), Err(StorageError::NotFound(_))));
}

#[test]
fn list_skips_unreadable_entries() {
    let dir = tempdir().unwrap();
    let store = WorkspaceRecordStore::new(ProjectLayout::new(dir.path()));
    store.save(&record("w1")).unwrap();
    std::fs::create_dir_all(dir.path().join(".amux/workspaces/broken")).unwrap();
    std::fs::write(dir.path().join(".amux/workspaces/broken/info.json"), b"{not json").unwrap();

    let records = store.list().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, WorkspaceId::new("w1"));
}

#[test]
fn delete_removes_directory() {
    let dir = tempdir().unwrap();
    let store = WorkspaceRecordStore::new(ProjectLayout::new(dir.path()));
    store.save(&record("w1")).unwrap();
    store.delete("w1").unwrap();
    assert!(!store.exists("w1"));
}
