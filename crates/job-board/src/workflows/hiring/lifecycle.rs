//! Transition graph for the application lifecycle and the policy knobs that decide how
//! strictly it is enforced.
//!
//! Employers historically could set any status, and interview events overwrote the
//! application status unconditionally. Both behaviors remain the default; the stricter
//! modes are opt-in through [`LifecyclePolicy`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::domain::ApplicationStatus;

impl ApplicationStatus {
    /// Statuses an employer may move to directly from `self` under strict transitions.
    pub const fn successors(self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;

        match self {
            Pending => &[UnderReview, InterviewScheduled, Rejected],
            UnderReview => &[InterviewScheduled, OfferExtended, Rejected],
            InterviewScheduled => &[InterviewCompleted, Rejected],
            InterviewCompleted => &[InterviewScheduled, OfferExtended, Rejected],
            OfferExtended => &[OfferAccepted, OfferDeclined],
            OfferAccepted | OfferDeclined | Rejected => &[],
        }
    }

    pub const fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }

    /// Whether the offer stage has not been reached yet.
    pub const fn is_pre_offer(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Pending
                | ApplicationStatus::UnderReview
                | ApplicationStatus::InterviewScheduled
                | ApplicationStatus::InterviewCompleted
        )
    }

    /// A self-transition counts as allowed so repeated writes stay idempotent.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self == next || self.successors().contains(&next)
    }

    /// True when `target` is `self` or lies somewhere ahead of it in the graph.
    pub fn reaches(self, target: ApplicationStatus) -> bool {
        if self == target {
            return true;
        }

        let mut seen = vec![self];
        let mut queue = VecDeque::from([self]);
        while let Some(current) = queue.pop_front() {
            for &next in current.successors() {
                if next == target {
                    return true;
                }
                if !seen.contains(&next) {
                    seen.push(next);
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

/// How employer-initiated status updates are validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    /// Any member of the status enum is accepted.
    #[default]
    Lenient,
    /// Only edges from the transition table are accepted.
    Strict,
}

/// How interview events write the parent application's status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatusWrites {
    /// Overwrite regardless of the current status.
    #[default]
    Legacy,
    /// Skip the write when it would move the application backwards.
    ForwardOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecyclePolicy {
    pub transitions: TransitionMode,
    pub interview_writes: InterviewStatusWrites,
}

impl LifecyclePolicy {
    pub const fn strict() -> Self {
        Self {
            transitions: TransitionMode::Strict,
            interview_writes: InterviewStatusWrites::ForwardOnly,
        }
    }

    pub fn permits_update(&self, current: ApplicationStatus, next: ApplicationStatus) -> bool {
        match self.transitions {
            TransitionMode::Lenient => true,
            TransitionMode::Strict => current.can_transition_to(next),
        }
    }

    /// Status an interview event should leave on the application, if any.
    pub fn coupled_status(
        &self,
        current: ApplicationStatus,
        target: ApplicationStatus,
    ) -> Option<ApplicationStatus> {
        match self.interview_writes {
            InterviewStatusWrites::Legacy => Some(target),
            InterviewStatusWrites::ForwardOnly if current.reaches(target) => Some(target),
            InterviewStatusWrites::ForwardOnly => None,
        }
    }
}
