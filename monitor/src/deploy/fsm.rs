//! Finite State Machine for deployment monitoring

use serde::{Deserialize, Serialize};

/// Monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MonitorState {
    /// Waiting for the remote tests to resolve
    Polling,

    /// A test run failed before the rest finished
    FailedEarly,

    /// Every test run passed
    Succeeded,

    /// The attempt ceiling was reached
    TimedOut,

    /// The API rejected the credentials
    AuthError,
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MonitorState::Polling)
    }

    /// Process exit code for a terminal state: 0 success, 1 failure, 2 timeout
    pub fn exit_code(&self) -> i32 {
        match self {
            MonitorState::Succeeded => 0,
            MonitorState::TimedOut => 2,
            MonitorState::Polling | MonitorState::FailedEarly | MonitorState::AuthError => 1,
        }
    }
}

/// Monitor event
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A poll returned a snapshot that is not terminal yet
    StillRunning,

    /// A poll failed with a recoverable error
    PollFailed(String),

    /// The API answered 401/403
    AuthRejected(String),

    /// A test run (or the deployment) reported failure
    TestsFailed,

    /// All tests completed successfully
    TestsPassed,

    /// The last allowed attempt finished without a verdict
    AttemptsExhausted,
}

/// Monitor FSM
#[derive(Debug, Clone)]
pub struct MonitorFsm {
    state: MonitorState,
    error: Option<String>,
    attempts: u32,
}

impl MonitorFsm {
    /// Create a new FSM in polling state
    pub fn new() -> Self {
        Self {
            state: MonitorState::Polling,
            error: None,
            attempts: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Last error message, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Polls made so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: MonitorEvent) -> Result<MonitorState, String> {
        if self.state.is_terminal() {
            return Err(format!(
                "Invalid transition: {:?} -> {:?}",
                self.state, event
            ));
        }

        let new_state = match event {
            MonitorEvent::StillRunning => {
                self.attempts += 1;
                self.error = None;
                MonitorState::Polling
            }
            MonitorEvent::PollFailed(err) => {
                self.attempts += 1;
                self.error = Some(err);
                MonitorState::Polling
            }
            MonitorEvent::AuthRejected(err) => {
                self.attempts += 1;
                self.error = Some(err);
                MonitorState::AuthError
            }
            MonitorEvent::TestsFailed => {
                self.attempts += 1;
                MonitorState::FailedEarly
            }
            MonitorEvent::TestsPassed => {
                self.attempts += 1;
                MonitorState::Succeeded
            }
            MonitorEvent::AttemptsExhausted => MonitorState::TimedOut,
        };

        self.state = new_state;
        Ok(new_state)
    }

    /// Check if another poll is allowed
    pub fn can_poll(&self, max_attempts: u32) -> bool {
        self.state == MonitorState::Polling && self.attempts < max_attempts
    }
}

impl Default for MonitorFsm {
    fn default() -> Self {
        Self::new()
    }
}
