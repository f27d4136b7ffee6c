use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::cancel::{CancellationToken, PollPolicy, Poller};
use crate::error::ModerationError;
use crate::model::network::Network;
use crate::model::{Effort, Strategy};
use crate::outcome::{Outcome, Solution};
use crate::solver::{Solver, SolverKind};

/// Exact solver over achievable cumulative costs.
///
/// Both the effort and the conflict numerator `Σ (count_i - e_i) * weight_i` are sums of
/// per-group terms, so groups are folded in one at a time. For each exactly achievable
/// cost only the smallest numerator is kept; the frontier never holds more than
/// `budget + 1` entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicProgramming {
    pub poll: PollPolicy,
}

#[derive(Debug, Clone)]
struct Partial {
    numerator: f64,
    decisions: Strategy,
}

/// Cumulative cost -> best partial allocation reaching exactly that cost.
type Frontier = BTreeMap<Effort, Partial>;

impl Solver for DynamicProgramming {
    fn kind(&self) -> SolverKind {
        SolverKind::DynamicProgramming
    }

    fn solve(
        &self,
        network: &Network,
        token: &CancellationToken,
    ) -> Result<Outcome, ModerationError> {
        let budget = network.budget();
        debug!(solver = %self.kind(), groups = network.groups().len(), budget, "search started");

        let mut poller = Poller::new(token, self.poll);
        if poller.cancelled() {
            debug!(solver = %self.kind(), "cancelled before start");
            return Ok(Outcome::Cancelled);
        }
        let mut frontier = Frontier::from([(0, Partial { numerator: 0.0, decisions: Vec::new() })]);
        for (group_index, group) in network.groups().iter().enumerate() {
            let mut next = Frontier::new();
            for (&cost, partial) in &frontier {
                if poller.tick() {
                    let states = frontier.len();
                    debug!(solver = %self.kind(), group_index, states, "search cancelled");
                    return Ok(Outcome::Cancelled);
                }
                for moderated in 0..=group.count() {
                    let total = cost.saturating_add(group.cost(moderated)?);
                    // cost is non-decreasing in `moderated`
                    if total > budget {
                        break;
                    }
                    let remaining = (group.count() - moderated) as f64;
                    let numerator = partial.numerator + remaining * group.weight();
                    match next.entry(total) {
                        Entry::Vacant(slot) => {
                            slot.insert(partial.extended(numerator, moderated));
                        }
                        Entry::Occupied(mut slot) => {
                            if numerator < slot.get().numerator {
                                slot.insert(partial.extended(numerator, moderated));
                            }
                        }
                    }
                }
            }
            frontier = next;
            let states = frontier.len();
            trace!(solver = %self.kind(), group_index, states, "frontier rebuilt");
        }

        let best = frontier
            .into_iter()
            .fold(None::<(Effort, Partial)>, |best, (cost, partial)| match best {
                Some(best) if best.1.numerator <= partial.numerator => Some(best),
                _ => Some((cost, partial)),
            });

        let Some((effort, Partial { numerator, decisions })) = best else {
            debug!(solver = %self.kind(), "no allocation fits the budget");
            return Ok(Outcome::Infeasible);
        };
        let conflict = network.normalize(numerator);
        let visited = poller.units();
        debug!(solver = %self.kind(), effort, conflict, visited, "search finished");
        Ok(Outcome::Found(Solution { strategy: decisions, effort, conflict }))
    }
}

impl Partial {
    fn extended(&self, numerator: f64, moderated: usize) -> Partial {
        let mut decisions = Vec::with_capacity(self.decisions.len() + 1);
        decisions.extend_from_slice(&self.decisions);
        decisions.push(moderated);
        Partial { numerator, decisions }
    }
}
