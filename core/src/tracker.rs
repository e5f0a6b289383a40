use sesame_common::{RunState, debug, warn};

/// Follows one run through its [`RunState`] transitions.
///
/// Illegal transitions are logged and trip a debug assertion. They indicate a
/// sequencing bug in the engine, never a remote-side condition.
#[derive(Debug)]
pub struct RunTracker {
    endpoint: String,
    state: RunState,
    history: Vec<RunState>,
}

impl RunTracker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: RunState::Idle,
            history: vec![RunState::Idle],
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    pub fn advance(&mut self, next: RunState) {
        let legal: bool = self.state.can_transition_to(next);
        if !legal {
            warn!(
                endpoint = %self.endpoint,
                from = %self.state,
                to = %next,
                "illegal run state transition"
            );
        }
        debug_assert!(legal, "illegal transition {:?} -> {:?}", self.state, next);

        debug!(endpoint = %self.endpoint, from = %self.state, to = %next, "run state");
        self.state = next;
        self.history.push(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_history_in_order() {
        let mut tracker: RunTracker = RunTracker::new("shell://h:22");
        tracker.advance(RunState::Connecting(0));
        tracker.advance(RunState::Connecting(1));
        tracker.advance(RunState::Authenticated);

        assert_eq!(tracker.state(), RunState::Authenticated);
        assert_eq!(
            tracker.history(),
            &[
                RunState::Idle,
                RunState::Connecting(0),
                RunState::Connecting(1),
                RunState::Authenticated
            ]
        );
    }

    #[test]
    #[should_panic(expected = "illegal transition")]
    fn illegal_transition_trips_debug_assertion() {
        let mut tracker: RunTracker = RunTracker::new("shell://h:22");
        tracker.advance(RunState::Executing);
    }
}
