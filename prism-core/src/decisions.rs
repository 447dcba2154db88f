//! Feedback decision tracker.
//!
//! Decisions follow a revert-first rule: an accepted item must be reverted
//! to pending before it can be rejected, and vice versa. Re-confirming the
//! current decision is allowed. Each feedback id may have at most one
//! decision request in flight.

use std::collections::HashSet;

use crate::error::{Result, ReviewError};
use crate::types::Decision;

/// A reviewer action on a single feedback item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionAction {
    Accept,
    Reject,
    Revert,
}

impl DecisionAction {
    /// Decision the item ends up in when the action succeeds.
    pub fn target(self) -> Decision {
        match self {
            DecisionAction::Accept => Decision::Accepted,
            DecisionAction::Reject => Decision::Rejected,
            DecisionAction::Revert => Decision::Pending,
        }
    }

    /// Backend route for this action.
    pub fn endpoint(self) -> &'static str {
        match self {
            DecisionAction::Accept => "/accept_feedback",
            DecisionAction::Reject => "/reject_feedback",
            DecisionAction::Revert => "/revert_feedback",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            DecisionAction::Accept => "accepted",
            DecisionAction::Reject => "rejected",
            DecisionAction::Revert => "reverted",
        }
    }
}

/// Checks `current -> action.target()` against the revert-first rule.
pub fn transition(current: Decision, action: DecisionAction) -> Result<Decision> {
    let target = action.target();
    match (current, action) {
        (_, DecisionAction::Revert) => Ok(target),
        (Decision::Pending, _) => Ok(target),
        (from, _) if from == target => Ok(target),
        (from, _) => Err(ReviewError::InvalidTransition { from, to: target }),
    }
}

/// Which action affordances are enabled for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub accept: bool,
    pub reject: bool,
    pub revert: bool,
}

impl Controls {
    pub const DISABLED: Controls = Controls {
        accept: false,
        reject: false,
        revert: false,
    };

    pub fn for_decision(decision: Decision) -> Self {
        match decision {
            Decision::Pending => Controls {
                accept: true,
                reject: true,
                revert: false,
            },
            Decision::Accepted | Decision::Rejected => Controls {
                accept: false,
                reject: false,
                revert: true,
            },
        }
    }
}

/// In-flight bookkeeping for decision requests.
#[derive(Debug, Default)]
pub struct DecisionTracker {
    in_flight: HashSet<String>,
}

impl DecisionTracker {
    /// Claims the in-flight slot for `feedback_id`.
    pub fn claim(&mut self, feedback_id: &str) -> Result<()> {
        if !self.in_flight.insert(feedback_id.to_owned()) {
            return Err(ReviewError::RequestInFlight(feedback_id.to_owned()));
        }
        Ok(())
    }

    pub fn release(&mut self, feedback_id: &str) {
        self.in_flight.remove(feedback_id);
    }

    pub fn is_in_flight(&self, feedback_id: &str) -> bool {
        self.in_flight.contains(feedback_id)
    }

    pub fn controls(&self, feedback_id: &str, decision: Decision) -> Controls {
        if self.is_in_flight(feedback_id) {
            Controls::DISABLED
        } else {
            Controls::for_decision(decision)
        }
    }

    pub fn clear(&mut self) {
        self.in_flight.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_first_rule() {
        use Decision::*;
        use DecisionAction::*;
        assert_eq!(transition(Pending, Accept), Ok(Accepted));
        assert_eq!(transition(Pending, Reject), Ok(Rejected));
        assert_eq!(transition(Accepted, Accept), Ok(Accepted));
        assert_eq!(transition(Rejected, Revert), Ok(Pending));
        assert_eq!(transition(Pending, Revert), Ok(Pending));
        assert_eq!(
            transition(Accepted, Reject),
            Err(ReviewError::InvalidTransition { from: Accepted, to: Rejected })
        );
        assert_eq!(
            transition(Rejected, Accept),
            Err(ReviewError::InvalidTransition { from: Rejected, to: Accepted })
        );
    }

    #[test]
    fn in_flight_guard_blocks_duplicates_and_disables_controls() {
        let mut tracker = DecisionTracker::default();
        tracker.claim("f1").unwrap();
        assert_eq!(tracker.claim("f1"), Err(ReviewError::RequestInFlight("f1".into())));
        assert_eq!(tracker.controls("f1", Decision::Pending), Controls::DISABLED);
        tracker.release("f1");
        assert!(tracker.claim("f1").is_ok());
    }

    #[test]
    fn controls_follow_decision() {
        let pending = Controls::for_decision(Decision::Pending);
        assert!(pending.accept && pending.reject && !pending.revert);
        let accepted = Controls::for_decision(Decision::Accepted);
        assert!(!accepted.accept && !accepted.reject && accepted.revert);
    }
}
