use tracing::debug;

use crate::cancel::{CancellationToken, PollPolicy, Poller};
use crate::error::ModerationError;
use crate::model::network::Network;
use crate::model::strategy::StrategyEnumerator;
use crate::outcome::{Outcome, Solution};
use crate::solver::{Solver, SolverKind};

/// Brute force over every strategy. Exponential in the number of groups; it is the
/// reference the other solvers are checked against.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exhaustive {
    pub poll: PollPolicy,
}

impl Solver for Exhaustive {
    fn kind(&self) -> SolverKind {
        SolverKind::Exhaustive
    }

    fn solve(
        &self,
        network: &Network,
        token: &CancellationToken,
    ) -> Result<Outcome, ModerationError> {
        let strategies = StrategyEnumerator::new(network);
        let combinations = strategies.total();
        debug!(solver = %self.kind(), combinations, budget = network.budget(), "search started");

        let mut poller = Poller::new(token, self.poll);
        if poller.cancelled() {
            debug!(solver = %self.kind(), "cancelled before start");
            return Ok(Outcome::Cancelled);
        }
        let mut best: Option<Solution> = None;
        for strategy in strategies {
            if poller.tick() {
                debug!(solver = %self.kind(), visited = poller.units(), "search cancelled");
                return Ok(Outcome::Cancelled);
            }
            let effort = network.total_effort(&strategy)?;
            if effort > network.budget() {
                continue;
            }
            let conflict = network.conflict_of(&strategy)?;
            // strict: the earliest strategy wins ties
            if best.as_ref().map_or(true, |best| conflict < best.conflict) {
                best = Some(Solution { strategy, effort, conflict });
            }
        }

        let visited = poller.units();
        debug!(solver = %self.kind(), visited, found = best.is_some(), "search finished");
        Ok(best.map_or(Outcome::Infeasible, Outcome::Found))
    }
}
