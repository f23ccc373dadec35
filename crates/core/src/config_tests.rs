use super::*;
use tempfile::tempdir;

#[test]
fn missing_config_file_yields_spec_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.idle_threshold_secs, 30);
    assert_eq!(config.reconcile_interval_secs, 5);
    assert_eq!(config.stop_grace_secs, 10);
    assert_eq!(config.ring_buffer_lines, 1_000);
}

#[test]
fn partial_config_file_fills_in_remaining_defaults() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "idle_threshold_secs: 60\n").unwrap();
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.idle_threshold_secs, 60);
    assert_eq!(config.reconcile_interval_secs, 5);
}

#[test]
fn project_layout_paths_are_rooted_under_dot_amux() {
    let layout = ProjectLayout::new("/proj");
    assert_eq!(layout.config_path(), std::path::PathBuf::from("/proj/.amux/config.yaml"));
    assert_eq!(
        layout.session_info_path("s1"),
        std::path::PathBuf::from("/proj/.amux/sessions/s1/info.json")
    );
    assert_eq!(
        layout.status_path("s1", 2),
        std::path::PathBuf::from("/proj/.amux/sessions/s1/2/status.yaml")
    );
}

#[test]
fn socket_path_falls_back_to_relative_when_too_long() {
    let long_tmp = std::path::PathBuf::from("/tmp/".to_string() + &"x".repeat(200));
    let p = socket_path(&long_tmp, "0123456789abcdef");
    assert!(p.as_os_str().len() < 100);
}

#[test]
fn socket_path_stays_absolute_when_short_enough() {
    let p = socket_path(std::path::Path::new("/tmp"), "s1");
    assert_eq!(p, std::path::PathBuf::from("/tmp/amux-s1.sock"));
}
