//! Lifecycle of a single probing run.
//!
//! ```text
//! Idle -> Connecting(0) -> Connecting(1) -> ... -> Authenticated -> Executing -> Completed
//!                      \-> AllCandidatesExhausted             \            \-> TimedOut
//!                      \-> ConnectionError                     \-> Completed \-> RuntimeError
//! ```
//!
//! `Authenticated -> Completed` covers runs that only probe and issue no commands.
//! `Idle -> ConnectionError` covers runs cancelled before their first attempt.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Trying the candidate at this position of the credential set.
    Connecting(usize),
    Authenticated,
    Executing,
    Completed,
    TimedOut,
    RuntimeError,
    AllCandidatesExhausted,
    ConnectionError,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::Completed
                | RunState::TimedOut
                | RunState::RuntimeError
                | RunState::AllCandidatesExhausted
                | RunState::ConnectionError
        )
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// Candidate indices only move forward by one, so no candidate is entered twice.
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Idle, Connecting(0)) => true,
            (Idle, AllCandidatesExhausted | ConnectionError) => true,
            (Connecting(i), Connecting(j)) => j == i + 1,
            (Connecting(_), Authenticated | AllCandidatesExhausted | ConnectionError) => true,
            (Authenticated, Executing | Completed | ConnectionError) => true,
            (Executing, Completed | TimedOut | RuntimeError | ConnectionError) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Connecting(index) => write!(f, "connecting (candidate #{index})"),
            other => write!(f, "{}", format!("{other:?}").to_lowercase()),
        }
    }
}
