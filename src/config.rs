use std::time::Duration;

use itertools::Itertools;

use crate::cancel::PollPolicy;
use crate::solver::SolverKind;

/// Settings for one optimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveConfig {
    pub solvers: Vec<SolverKind>,
    pub poll: PollPolicy,
    /// Cancel every solver still running after this long.
    pub timeout: Option<Duration>,
}

impl Default for SolveConfig {
    fn default() -> Self {
        SolveConfig {
            solvers: SolverKind::ALL.to_vec(),
            poll: PollPolicy::default(),
            timeout: None,
        }
    }
}

impl SolveConfig {
    pub fn with_solvers(mut self, solvers: impl IntoIterator<Item = SolverKind>) -> Self {
        self.solvers = solvers.into_iter().collect();
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Selected solvers without repeats, in their canonical order.
    /// All of them when none were named.
    pub fn selected(&self) -> Vec<SolverKind> {
        if self.solvers.is_empty() {
            return SolverKind::ALL.to_vec();
        }
        self.solvers.iter().copied().sorted().dedup().collect()
    }
}
