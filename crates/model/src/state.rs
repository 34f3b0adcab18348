use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a questionnaire session.
///
/// Options may also carry one of these as a terminal-state override; an
/// option without an override holds `None` in its `Option<State>` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Initialized,
    Running,
    Completed,
    Done,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Initialized => "initialized",
            State::Running => "running",
            State::Completed => "completed",
            State::Done => "done",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
