//! View lifecycle state machine.
//!
//! Exactly one view is active at any instant and this machine is the only
//! authority allowed to change it. Every submission is tagged with a
//! `RequestId`; completions carrying a stale id are ignored, which is what
//! makes navigating away from Loading a real cancellation.

/// Tag for one submission. Monotonically increasing within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Input,
    Loading,
    Results,
}

#[derive(Debug)]
pub struct ViewStateMachine {
    state: ViewState,
    next_id: u64,
    active_request: Option<RequestId>,
    failure_notice: Option<String>,
}

impl Default for ViewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStateMachine {
    pub fn new() -> Self {
        Self {
            state: ViewState::Input,
            next_id: 0,
            active_request: None,
            failure_notice: None,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn active_request(&self) -> Option<RequestId> {
        self.active_request
    }

    /// Set when an analysis failed; cleared on the next submission.
    pub fn failure_notice(&self) -> Option<&str> {
        self.failure_notice.as_deref()
    }

    /// Input -> Loading. Returns the id tagging this submission, or `None`
    /// when the transition is invalid (not in Input), which also guards
    /// against a second submission while one is in flight.
    pub fn begin_analysis(&mut self) -> Option<RequestId> {
        if self.state != ViewState::Input {
            return None;
        }
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.active_request = Some(id);
        self.failure_notice = None;
        self.state = ViewState::Loading;
        Some(id)
    }

    /// Loading -> Results, valid only for the response belonging to the
    /// active request. A stale or unexpected completion returns `false` and
    /// leaves the machine untouched.
    pub fn complete_analysis(&mut self, id: RequestId) -> bool {
        if self.state == ViewState::Loading && self.active_request == Some(id) {
            self.active_request = None;
            self.state = ViewState::Results;
            true
        } else {
            false
        }
    }

    /// Loading -> Input with a visible failure notice. Stale failures are
    /// discarded the same way as stale completions.
    pub fn fail_analysis(&mut self, id: RequestId, notice: impl Into<String>) -> bool {
        if self.state == ViewState::Loading && self.active_request == Some(id) {
            self.active_request = None;
            self.failure_notice = Some(notice.into());
            self.state = ViewState::Input;
            true
        } else {
            false
        }
    }

    /// Results -> Input, or Loading -> Input when the user abandons a
    /// pending request. Dropping the active id is what cancels interest in
    /// the eventual response.
    pub fn return_to_input(&mut self) -> bool {
        match self.state {
            ViewState::Results | ViewState::Loading => {
                self.active_request = None;
                self.state = ViewState::Input;
                true
            }
            ViewState::Input => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_only_cycle_is_input_loading_results_input() {
        let mut vsm = ViewStateMachine::new();
        assert_eq!(vsm.state(), ViewState::Input);

        let id = vsm.begin_analysis().expect("Input -> Loading");
        assert_eq!(vsm.state(), ViewState::Loading);

        assert!(vsm.complete_analysis(id));
        assert_eq!(vsm.state(), ViewState::Results);

        assert!(vsm.return_to_input());
        assert_eq!(vsm.state(), ViewState::Input);
    }

    #[test]
    fn begin_is_rejected_outside_input() {
        let mut vsm = ViewStateMachine::new();
        let _ = vsm.begin_analysis().unwrap();
        assert!(vsm.begin_analysis().is_none(), "already loading");

        let id = vsm.active_request();
        assert!(id.is_some(), "active request survives the rejected begin");
    }

    #[test]
    fn completion_is_rejected_outside_loading() {
        let mut vsm = ViewStateMachine::new();
        let id = vsm.begin_analysis().unwrap();
        assert!(vsm.complete_analysis(id));
        // Results: a duplicate completion must not re-fire.
        assert!(!vsm.complete_analysis(id));
        assert_eq!(vsm.state(), ViewState::Results);
    }

    #[test]
    fn stale_response_is_discarded_after_returning_to_input() {
        let mut vsm = ViewStateMachine::new();
        let stale = vsm.begin_analysis().unwrap();
        assert!(vsm.return_to_input(), "user navigates away while loading");

        assert!(!vsm.complete_analysis(stale));
        assert_eq!(vsm.state(), ViewState::Input);
    }

    #[test]
    fn stale_response_is_discarded_after_resubmission() {
        let mut vsm = ViewStateMachine::new();
        let first = vsm.begin_analysis().unwrap();
        vsm.return_to_input();
        let second = vsm.begin_analysis().unwrap();
        assert_ne!(first, second);

        assert!(!vsm.complete_analysis(first), "superseded response");
        assert_eq!(vsm.state(), ViewState::Loading);
        assert!(vsm.complete_analysis(second));
    }

    #[test]
    fn failure_returns_to_input_with_a_notice() {
        let mut vsm = ViewStateMachine::new();
        let id = vsm.begin_analysis().unwrap();
        assert!(vsm.fail_analysis(id, "connection refused"));
        assert_eq!(vsm.state(), ViewState::Input);
        assert_eq!(vsm.failure_notice(), Some("connection refused"));

        // The notice clears on the next submission.
        let _ = vsm.begin_analysis().unwrap();
        assert_eq!(vsm.failure_notice(), None);
    }

    #[test]
    fn stale_failure_is_discarded() {
        let mut vsm = ViewStateMachine::new();
        let stale = vsm.begin_analysis().unwrap();
        vsm.return_to_input();
        assert!(!vsm.fail_analysis(stale, "late timeout"));
        assert_eq!(vsm.failure_notice(), None);
    }
}
