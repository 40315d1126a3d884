//! FSM unit tests

use deploywatch::deploy::fsm::{MonitorEvent, MonitorFsm, MonitorState};

#[test]
fn test_fsm_initial_state() {
    let fsm = MonitorFsm::new();
    assert_eq!(fsm.state(), MonitorState::Polling);
    assert!(fsm.error().is_none());
    assert_eq!(fsm.attempts(), 0);
    assert!(fsm.can_poll(60));
}

#[test]
fn test_fsm_keeps_polling_through_errors() {
    let mut fsm = MonitorFsm::new();

    fsm.process(MonitorEvent::PollFailed("connection refused".to_string()))
        .unwrap();
    assert_eq!(fsm.state(), MonitorState::Polling);
    assert_eq!(fsm.error(), Some("connection refused"));

    // a good poll clears the error
    fsm.process(MonitorEvent::StillRunning).unwrap();
    assert!(fsm.error().is_none());
    assert_eq!(fsm.attempts(), 2);
}

#[test]
fn test_fsm_attempt_ceiling() {
    let mut fsm = MonitorFsm::new();
    for _ in 0..3 {
        fsm.process(MonitorEvent::StillRunning).unwrap();
    }
    assert!(!fsm.can_poll(3));

    fsm.process(MonitorEvent::AttemptsExhausted).unwrap();
    assert_eq!(fsm.state(), MonitorState::TimedOut);
    assert_eq!(fsm.state().exit_code(), 2);
}

#[test]
fn test_fsm_auth_error_is_terminal() {
    let mut fsm = MonitorFsm::new();

    fsm.process(MonitorEvent::AuthRejected("HTTP 401".to_string()))
        .unwrap();
    assert_eq!(fsm.state(), MonitorState::AuthError);
    assert_eq!(fsm.state().exit_code(), 1);
    assert!(!fsm.can_poll(60));
}

#[test]
fn test_fsm_invalid_transition() {
    let mut fsm = MonitorFsm::new();
    fsm.process(MonitorEvent::TestsPassed).unwrap();

    // Cannot leave a terminal state
    let result = fsm.process(MonitorEvent::StillRunning);
    assert!(result.is_err());
    assert_eq!(fsm.state(), MonitorState::Succeeded);
}
