use tracing::{debug, trace};

use crate::cancel::{CancellationToken, PollPolicy, Poller};
use crate::error::ModerationError;
use crate::model::network::Network;
use crate::model::{Effort, Index, Strategy};
use crate::outcome::{Outcome, Solution};
use crate::solver::{Solver, SolverKind};

/// Best-ratio heuristic: moderate one agent at a time in the group with the highest
/// `weight / marginal cost`. Not optimal.
///
/// The benefit of a group is its full weight regardless of how many of its agents are
/// already moderated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy {
    pub poll: PollPolicy,
}

struct State {
    moderated: Strategy,
    spent: Effort,
    steps: usize,
}

struct Candidate {
    group_index: Index,
    delta: Effort,
    ratio: f64,
}

impl Solver for Greedy {
    fn kind(&self) -> SolverKind {
        SolverKind::Greedy
    }

    fn solve(
        &self,
        network: &Network,
        token: &CancellationToken,
    ) -> Result<Outcome, ModerationError> {
        let groups = network.groups();
        let budget = network.budget();
        debug!(solver = %self.kind(), groups = groups.len(), budget, "search started");

        let mut poller = Poller::new(token, self.poll);
        if poller.cancelled() {
            debug!(solver = %self.kind(), "cancelled before start");
            return Ok(Outcome::Cancelled);
        }
        let mut state = State { moderated: network.zero_strategy(), spent: 0, steps: 0 };
        loop {
            let mut pick: Option<Candidate> = None;
            for (group_index, group) in groups.iter().enumerate() {
                if poller.tick() {
                    let State { steps, spent, .. } = state;
                    debug!(solver = %self.kind(), steps, spent, "search cancelled");
                    return Ok(Outcome::Cancelled);
                }
                let current = state.moderated[group_index];
                if current >= group.count() {
                    continue;
                }
                // A free step would let the loop spin; charge at least one unit.
                let delta =
                    group.cost(current + 1)?.saturating_sub(group.cost(current)?).max(1);
                if state.spent.saturating_add(delta) > budget {
                    continue;
                }
                let ratio = group.weight() / delta as f64;
                if pick.as_ref().map_or(true, |best| ratio > best.ratio) {
                    pick = Some(Candidate { group_index, delta, ratio });
                }
            }

            let Some(Candidate { group_index, delta, ratio }) = pick else {
                break;
            };
            state.moderated[group_index] += 1;
            state.spent += delta;
            state.steps += 1;
            let spent = state.spent;
            trace!(solver = %self.kind(), group_index, delta, ratio, spent, "moderated one agent");
        }

        let numerator: f64 = groups
            .iter()
            .zip(&state.moderated)
            .map(|(group, &moderated)| (group.count() - moderated) as f64 * group.weight())
            .sum();
        let conflict = network.normalize(numerator);
        let effort = network.total_effort(&state.moderated)?;

        let State { steps, spent, .. } = state;
        debug!(solver = %self.kind(), steps, spent, effort, conflict, "search finished");
        Ok(Outcome::Found(Solution { strategy: state.moderated, effort, conflict }))
    }
}
