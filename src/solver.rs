use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::cancel::{CancellationToken, PollPolicy};
use crate::dynamic::DynamicProgramming;
use crate::error::ModerationError;
use crate::exhaustive::Exhaustive;
use crate::greedy::Greedy;
use crate::model::network::Network;
use crate::outcome::Outcome;

/// Common contract of the three solvers.
///
/// Solvers read the network's budget, never mutate the network, and report
/// [`Outcome::Cancelled`] instead of a partial answer once `token` is set.
pub trait Solver {
    fn kind(&self) -> SolverKind;

    fn solve(
        &self,
        network: &Network,
        token: &CancellationToken,
    ) -> Result<Outcome, ModerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    Exhaustive,
    Greedy,
    #[serde(rename = "dp")]
    #[value(name = "dp")]
    DynamicProgramming,
}

impl SolverKind {
    pub const ALL: [SolverKind; 3] =
        [SolverKind::Exhaustive, SolverKind::Greedy, SolverKind::DynamicProgramming];

    pub fn id(self) -> &'static str {
        match self {
            SolverKind::Exhaustive => "exhaustive",
            SolverKind::Greedy => "greedy",
            SolverKind::DynamicProgramming => "dp",
        }
    }

    pub fn solver(self, poll: PollPolicy) -> Box<dyn Solver + Send + Sync> {
        match self {
            SolverKind::Exhaustive => Box::new(Exhaustive { poll }),
            SolverKind::Greedy => Box::new(Greedy { poll }),
            SolverKind::DynamicProgramming => Box::new(DynamicProgramming { poll }),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown solver `{0}`, expected one of: exhaustive, greedy, dp")]
pub struct UnknownSolver(pub String);

impl FromStr for SolverKind {
    type Err = UnknownSolver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolverKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSolver(s.to_string()))
    }
}
