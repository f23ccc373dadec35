use super::*;

#[test]
fn every_kind_has_a_distinct_exit_code_or_is_explicitly_shared() {
    let timeout = AmuxError::Timeout.exit_code();
    let canceled = AmuxError::Canceled.exit_code();
    assert_eq!(timeout, canceled, "Timeout and Canceled intentionally share a code");

    let not_found = AmuxError::NotFound("x".into()).exit_code();
    assert_ne!(not_found, timeout);
}

#[test]
fn invalid_transition_message_names_both_states() {
    let err = AmuxError::InvalidTransition {
        from: Status::Stopped,
        to: Status::Running,
    };
    let msg = err.to_string();
    assert!(msg.contains("stopped"));
    assert!(msg.contains("running"));
    assert_eq!(err.kind(), "invalid_transition");
}

#[test]
fn io_error_converts_via_from() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
    let err: AmuxError = io_err.into();
    assert_eq!(err.kind(), "io_error");
}
