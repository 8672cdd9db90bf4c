//! Job state machine: Probing -> Planning -> Fetching -> Merging -> Done,
//! with Failed reachable from any non-terminal state.

use std::fmt;

use crate::error::PullError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Probing,
    Planning,
    Fetching,
    Merging,
    Done,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Done | JobPhase::Failed)
    }

    /// The phase that normally follows this one.
    pub fn next(self) -> Option<JobPhase> {
        match self {
            JobPhase::Probing => Some(JobPhase::Planning),
            JobPhase::Planning => Some(JobPhase::Fetching),
            JobPhase::Fetching => Some(JobPhase::Merging),
            JobPhase::Merging => Some(JobPhase::Done),
            JobPhase::Done | JobPhase::Failed => None,
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobPhase::Probing => "probing",
            JobPhase::Planning => "planning",
            JobPhase::Fetching => "fetching",
            JobPhase::Merging => "merging",
            JobPhase::Done => "done",
            JobPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Tracks and logs the current phase of one job.
#[derive(Debug)]
pub(super) struct PhaseTracker<'a> {
    url: &'a str,
    current: JobPhase,
}

impl<'a> PhaseTracker<'a> {
    pub(super) fn start(url: &'a str) -> Self {
        tracing::debug!(url, phase = %JobPhase::Probing, "job started");
        Self {
            url,
            current: JobPhase::Probing,
        }
    }

    /// Move to the next phase in order.
    pub(super) fn advance(&mut self) -> JobPhase {
        debug_assert!(!self.current.is_terminal(), "advance from {}", self.current);
        let next = self.current.next().unwrap_or(JobPhase::Failed);
        tracing::debug!(url = self.url, from = %self.current, to = %next, "job phase");
        self.current = next;
        next
    }

    pub(super) fn fail(&mut self, err: &PullError) {
        tracing::warn!(url = self.url, phase = %self.current, "job failed: {}", err);
        self.current = JobPhase::Failed;
    }
}
