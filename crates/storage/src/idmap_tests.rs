use super::*;
use tempfile::tempdir;

#[test]
fn add_session_allocates_sequential_indices() {
    let dir = tempdir().unwrap();
    let map = IdMap::open(dir.path().join("id-mappings.yaml")).unwrap();
    assert_eq!(map.add_session("s1").unwrap(), "1");
    assert_eq!(map.add_session("s2").unwrap(), "2");
    assert_eq!(map.add_session("s3").unwrap(), "3");
}

#[test]
fn add_session_is_idempotent() {
    let dir = tempdir().unwrap();
    let map = IdMap::open(dir.path().join("id-mappings.yaml")).unwrap();
    let first = map.add_session("s1").unwrap();
    let second = map.add_session("s1").unwrap();
    assert_eq!(first, second);
}

#[test]
fn round_trip_full_and_short_lookup() {
    let dir = tempdir().unwrap();
    let map = IdMap::open(dir.path().join("id-mappings.yaml")).unwrap();
    let short = map.add_session("sess-full-id").unwrap();
    assert_eq!(map.get_session_full(&short).as_deref(), Some("sess-full-id"));
    assert_eq!(map.get_session_short("sess-full-id").as_deref(), Some(short.as_str()));
}

#[test]
fn remove_session_deletes_both_directions_without_reusing_index() {
    let dir = tempdir().unwrap();
    let map = IdMap::open(dir.path().join("id-mappings.yaml")).unwrap();
    let short = map.add_session("s1").unwrap();
    map.remove_session("s1").unwrap();
    assert_eq!(map.get_session_full(&short), None);
    assert_eq!(map.get_session_short("s1"), None);

    // Counter does not decrement: the next session gets a higher index.
    let next_short = map.add_session("s2").unwrap();
    assert_eq!(next_short, "2");
}

#[test]
fn sessions_and_workspaces_are_independent_namespaces() {
    let dir = tempdir().unwrap();
    let map = IdMap::open(dir.path().join("id-mappings.yaml")).unwrap();
    assert_eq!(map.add_session("s1").unwrap(), "1");
    assert_eq!(map.add_workspace("w1").unwrap(), "1");
}

#[test]
fn state_persists_and_reloads_across_instances() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("id-mappings.yaml");
    {
        let map = IdMap::open(&path).unwrap();
        map.add_session("s1").unwrap();
        map.add_session("s2").unwrap();
    }
    let reopened = IdMap::open(&path).unwrap();
    assert_eq!(reopened.get_session_short("s1").as_deref(), Some("1"));
    assert_eq!(reopened.get_session_short("s2").as_deref(), Some("2"));
    // Monotonic counter is preserved, not reset, across reloads.
    assert_eq!(reopened.add_session("s3").unwrap(), "3");
}

#[test]
fn unknown_short_index_resolves_to_none() {
    let dir = tempdir().unwrap();
    let map = IdMap::open(dir.path().join("id-mappings.yaml")).unwrap();
    assert_eq!(map.get_session_full("99"), None);
}

#[test]
fn second_handle_sees_first_handles_writes_instead_of_clobbering_them() {
    // Two `IdMap` handles over the same path stand in for two separate
    // CLI invocations racing each other. Each mutator must reload the
    // file under the lock rather than trust its own cached copy, or the
    // second handle's write would silently erase the first's.
    let dir = tempdir().unwrap();
    let path = dir.path().join("id-mappings.yaml");
    let a = IdMap::open(&path).unwrap();
    let b = IdMap::open(&path).unwrap();

    assert_eq!(a.add_session("s1").unwrap(), "1");
    assert_eq!(b.add_session("s2").unwrap(), "2");

    // `a` never reloaded its in-process cache on its own, but a fresh
    // handle opened after both writes must see both.
    let reopened = IdMap::open(&path).unwrap();
    assert_eq!(reopened.get_session_short("s1").as_deref(), Some("1"));
    assert_eq!(reopened.get_session_short("s2").as_deref(), Some("2"));
}
