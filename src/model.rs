pub type Index = usize;
pub type Effort = u64;
pub type Conflict = f64;
/// Number of agents moderated in each group, positionally.
pub type Strategy = Vec<usize>;

pub mod group {
    use super::{Conflict, Effort};
    use crate::error::ModerationError;

    /// A cohort of agents sharing the same two opinions and the same rigidity.
    ///
    /// Groups are immutable: moderation produces a new group with fewer agents and
    /// leaves the opinions untouched.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Group {
        count: usize,
        opinion_a: f64,
        opinion_b: f64,
        rigidity: f64,
        spread: f64,
        weight: f64,
    }

    impl Group {
        pub fn new(
            count: usize,
            opinion_a: f64,
            opinion_b: f64,
            rigidity: f64,
        ) -> Result<Group, ModerationError> {
            if !opinion_a.is_finite() || !opinion_b.is_finite() {
                return Err(ModerationError::InvalidGroup {
                    reason: format!("opinions must be finite, got {opinion_a} and {opinion_b}"),
                });
            }
            if !(0.0..=1.0).contains(&rigidity) {
                return Err(ModerationError::InvalidGroup {
                    reason: format!("rigidity must lie in [0, 1], got {rigidity}"),
                });
            }
            let spread = (opinion_a - opinion_b).abs();
            let weight = spread * spread;
            // finite opinions can still be far enough apart to overflow the weight
            if !weight.is_finite() {
                return Err(ModerationError::InvalidGroup {
                    reason: format!("opinions {opinion_a} and {opinion_b} are too far apart"),
                });
            }
            Ok(Group { count, opinion_a, opinion_b, rigidity, spread, weight })
        }

        pub fn count(&self) -> usize {
            self.count
        }

        pub fn opinion_a(&self) -> f64 {
            self.opinion_a
        }

        pub fn opinion_b(&self) -> f64 {
            self.opinion_b
        }

        pub fn rigidity(&self) -> f64 {
            self.rigidity
        }

        /// `|opinion_a - opinion_b|`
        pub fn spread(&self) -> f64 {
            self.spread
        }

        /// `spread²`, the per-agent conflict of this group.
        pub fn weight(&self) -> f64 {
            self.weight
        }

        fn check(&self, moderated: usize) -> Result<(), ModerationError> {
            if moderated > self.count {
                return Err(ModerationError::ExceedsCount {
                    requested: moderated,
                    available: self.count,
                });
            }
            Ok(())
        }

        /// Effort to moderate `moderated` agents: `ceil(spread * rigidity * moderated)`.
        ///
        /// The ceiling makes the marginal cost uneven; consecutive steps may cost nothing.
        /// Costs beyond `u64::MAX` saturate.
        pub fn cost(&self, moderated: usize) -> Result<Effort, ModerationError> {
            self.check(moderated)?;
            Ok((self.spread * self.rigidity * moderated as f64).ceil() as Effort)
        }

        pub fn conflict_contribution(&self) -> Conflict {
            self.count as f64 * self.weight
        }

        pub fn apply_moderation(&self, moderated: usize) -> Result<Group, ModerationError> {
            self.check(moderated)?;
            Ok(Group { count: self.count - moderated, ..self.clone() })
        }
    }
}

pub mod network {
    use itertools::Itertools;

    use super::group::Group;
    use super::{Conflict, Effort, Strategy};
    use crate::error::ModerationError;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Network {
        groups: Vec<Group>,
        budget: Effort,
        // Fixed at construction; derived networks keep it even when groups empty out.
        group_count: usize,
    }

    impl Network {
        pub fn new(groups: Vec<Group>, budget: Effort) -> Network {
            let group_count = groups.len();
            Network { groups, budget, group_count }
        }

        pub fn groups(&self) -> &[Group] {
            &self.groups
        }

        pub fn budget(&self) -> Effort {
            self.budget
        }

        pub fn group_count(&self) -> usize {
            self.group_count
        }

        pub fn zero_strategy(&self) -> Strategy {
            vec![0; self.groups.len()]
        }

        /// Divides a conflict numerator by the number of groups; an empty network has no conflict.
        pub(crate) fn normalize(&self, numerator: f64) -> Conflict {
            if self.group_count == 0 {
                0.0
            } else {
                numerator / self.group_count as f64
            }
        }

        pub fn internal_conflict(&self) -> Conflict {
            self.normalize(self.groups.iter().map(Group::conflict_contribution).sum())
        }

        fn check_length(&self, strategy: &[usize]) -> Result<(), ModerationError> {
            if strategy.len() != self.groups.len() {
                return Err(ModerationError::LengthMismatch {
                    expected: self.groups.len(),
                    found: strategy.len(),
                });
            }
            Ok(())
        }

        pub fn apply_strategy(&self, strategy: &[usize]) -> Result<Network, ModerationError> {
            self.check_length(strategy)?;
            let groups = self.groups
                .iter()
                .zip(strategy)
                .enumerate()
                .map(|(index, (group, &moderated))| {
                    group.apply_moderation(moderated).map_err(|err| err.at_group(index))
                })
                .collect::<Result<Vec<Group>, ModerationError>>()?;
            Ok(Network { groups, budget: self.budget, group_count: self.group_count })
        }

        /// Sum of the group costs, saturating at `u64::MAX`; a saturated total exceeds any budget.
        pub fn total_effort(&self, strategy: &[usize]) -> Result<Effort, ModerationError> {
            self.check_length(strategy)?;
            self.groups
                .iter()
                .zip(strategy)
                .enumerate()
                .map(|(index, (group, &moderated))| {
                    group.cost(moderated).map_err(|err| err.at_group(index))
                })
                .fold_ok(0, |total: Effort, cost| total.saturating_add(cost))
        }

        /// Conflict left after applying `strategy`.
        pub fn conflict_of(&self, strategy: &[usize]) -> Result<Conflict, ModerationError> {
            Ok(self.apply_strategy(strategy)?.internal_conflict())
        }
    }
}

pub mod strategy {
    use super::network::Network;
    use super::Strategy;

    /// Every strategy in `[0, count_0] x ... x [0, count_{n-1}]`, last group varying fastest.
    ///
    /// A network without groups has exactly one strategy: the empty one.
    #[derive(Debug, Clone)]
    pub struct StrategyEnumerator {
        limits: Vec<usize>,
        next: Option<Strategy>,
    }

    impl StrategyEnumerator {
        pub fn new(network: &Network) -> StrategyEnumerator {
            let limits: Vec<usize> = network.groups().iter().map(|group| group.count()).collect();
            let next = Some(vec![0; limits.len()]);
            StrategyEnumerator { limits, next }
        }

        /// `Π(count_i + 1)`, saturating at `usize::MAX`.
        pub fn total(&self) -> usize {
            self.checked_total().unwrap_or(usize::MAX)
        }

        fn checked_total(&self) -> Option<usize> {
            self.limits
                .iter()
                .try_fold(1usize, |acc, &limit| acc.checked_mul(limit.checked_add(1)?))
        }

        /// Strategies not yet yielded: the total minus the mixed-radix rank of the next one.
        fn remaining(&self) -> Option<usize> {
            let Some(next) = &self.next else {
                return Some(0);
            };
            let rank = next.iter().zip(&self.limits).try_fold(0usize, |rank, (&digit, &limit)| {
                rank.checked_mul(limit.checked_add(1)?)?.checked_add(digit)
            })?;
            self.checked_total()?.checked_sub(rank)
        }
    }

    impl Iterator for StrategyEnumerator {
        type Item = Strategy;

        fn next(&mut self) -> Option<Strategy> {
            let current = self.next.take()?;
            let mut successor = current.clone();
            for (digit, &limit) in successor.iter_mut().zip(&self.limits).rev() {
                if *digit < limit {
                    *digit += 1;
                    self.next = Some(successor);
                    return Some(current);
                }
                *digit = 0;
            }
            Some(current)
        }

        fn size_hint(&self) -> (usize, Option<usize>) {
            match self.remaining() {
                Some(remaining) => (remaining, Some(remaining)),
                None => (usize::MAX, None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::group::Group;
    use super::network::Network;
    use super::strategy::StrategyEnumerator;
    use crate::error::ModerationError;

    fn group(count: usize, a: f64, b: f64, rigidity: f64) -> Group {
        Group::new(count, a, b, rigidity).unwrap()
    }

    #[test]
    fn cost_is_ceiled_and_zero_at_origin() {
        let g = group(12, 28.0, 27.0, 0.326);
        let costs: Vec<u64> = (0..=12).map(|e| g.cost(e).unwrap()).collect();
        assert_eq!(costs, vec![0, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn rigid_free_group_costs_nothing() {
        let g = group(5, -10.0, 40.0, 0.0);
        assert!((0..=5).all(|e| g.cost(e) == Ok(0)));
    }

    #[test]
    fn cost_beyond_count_is_rejected() {
        let g = group(3, 0.0, 10.0, 0.5);
        assert_eq!(g.cost(4), Err(ModerationError::ExceedsCount { requested: 4, available: 3 }));
    }

    #[test]
    fn invalid_rigidity_is_rejected() {
        let invalid = |result: Result<Group, ModerationError>| {
            matches!(result, Err(ModerationError::InvalidGroup { .. }))
        };
        assert!(invalid(Group::new(1, 0.0, 1.0, 1.5)));
        assert!(invalid(Group::new(1, 0.0, 1.0, f64::NAN)));
        assert!(invalid(Group::new(1, f64::INFINITY, 1.0, 0.5)));
    }

    #[test]
    fn overflowing_weight_is_rejected() {
        let result = Group::new(0, 0.0, 1e200, 0.5);
        assert!(matches!(result, Err(ModerationError::InvalidGroup { .. })));
        // large but representable
        assert_eq!(group(1, 0.0, 2e19, 1.0).weight(), 4e38);
    }

    #[test]
    fn huge_costs_saturate() {
        let g = group(1, 0.0, 2e19, 1.0);
        assert_eq!(g.cost(1), Ok(u64::MAX));

        let network = Network::new(vec![group(1, 0.0, 1.0, 1.0), g], 5);
        assert_eq!(network.total_effort(&[1, 1]), Ok(u64::MAX));
        assert_eq!(network.total_effort(&[0, 1]), Ok(u64::MAX));
        assert_eq!(network.total_effort(&[1, 0]), Ok(1));
    }

    #[test]
    fn moderation_keeps_opinions() {
        let g = group(7, 33.0, 62.0, 0.49);
        let moderated = g.apply_moderation(3).unwrap();
        assert_eq!(moderated.count(), 4);
        assert_eq!(moderated.spread(), 29.0);
        assert_eq!(moderated.rigidity(), 0.49);
        assert_eq!(g.count(), 7);
        assert_eq!(moderated.conflict_contribution(), 4.0 * 841.0);
    }

    #[test]
    fn conflict_is_normalized_by_group_count() {
        let network = Network::new(vec![group(2, 0.0, 3.0, 0.5), group(1, 0.0, 1.0, 0.5)], 10);
        assert_eq!(network.internal_conflict(), (2.0 * 9.0 + 1.0) / 2.0);

        // Emptying a group does not change the denominator.
        let moderated = network.apply_strategy(&[0, 1]).unwrap();
        assert_eq!(moderated.group_count(), 2);
        assert_eq!(moderated.internal_conflict(), 9.0);
    }

    #[test]
    fn empty_network_has_no_conflict() {
        assert_eq!(Network::new(vec![], 0).internal_conflict(), 0.0);
    }

    #[test]
    fn strategy_length_must_match() {
        let network = Network::new(vec![group(2, 0.0, 3.0, 0.5)], 10);
        assert_eq!(
            network.apply_strategy(&[0, 0]),
            Err(ModerationError::LengthMismatch { expected: 1, found: 2 })
        );
        assert_eq!(
            network.total_effort(&[]),
            Err(ModerationError::LengthMismatch { expected: 1, found: 0 })
        );
    }

    #[test]
    fn over_moderation_reports_the_group() {
        let network = Network::new(vec![group(2, 0.0, 3.0, 0.5), group(1, 0.0, 1.0, 0.5)], 10);
        let err = network.apply_strategy(&[1, 2]).unwrap_err();
        assert!(matches!(err, ModerationError::AtGroup { group_index: 1, .. }));
    }

    #[test]
    fn total_effort_sums_group_costs() {
        let network =
            Network::new(vec![group(7, 33.0, 62.0, 0.49), group(11, -36.0, -1.0, 0.364)], 50);
        assert_eq!(network.total_effort(&[1, 3]).unwrap(), 15 + 39);
    }

    #[test]
    fn enumerator_is_an_odometer() {
        let network = Network::new(vec![group(1, 0.0, 1.0, 0.5), group(2, 0.0, 1.0, 0.5)], 0);
        let all: Vec<Vec<usize>> = StrategyEnumerator::new(&network).collect();
        assert_eq!(
            all,
            vec![vec![0, 0], vec![0, 1], vec![0, 2], vec![1, 0], vec![1, 1], vec![1, 2]]
        );
        assert_eq!(StrategyEnumerator::new(&network).total(), 6);
    }

    #[test]
    fn enumerator_reports_what_is_left() {
        let network = Network::new(vec![group(1, 0.0, 1.0, 0.5), group(2, 0.0, 1.0, 0.5)], 0);
        let mut strategies = StrategyEnumerator::new(&network);
        assert_eq!(strategies.size_hint(), (6, Some(6)));
        strategies.next();
        assert_eq!(strategies.size_hint(), (5, Some(5)));
        strategies.nth(3);
        assert_eq!(strategies.size_hint(), (1, Some(1)));
        assert_eq!(strategies.next(), Some(vec![1, 2]));
        assert_eq!(strategies.size_hint(), (0, Some(0)));
        assert_eq!(strategies.next(), None);
    }

    #[test]
    fn enumerator_size_hint_gives_up_on_overflow() {
        let groups = (0..8).map(|_| group(usize::MAX / 2, 0.0, 1.0, 0.5)).collect();
        let strategies = StrategyEnumerator::new(&Network::new(groups, 0));
        assert_eq!(strategies.total(), usize::MAX);
        assert_eq!(strategies.size_hint(), (usize::MAX, None));
    }

    #[test]
    fn enumerator_without_groups_yields_the_empty_strategy() {
        let network = Network::new(vec![], 0);
        let all: Vec<Vec<usize>> = StrategyEnumerator::new(&network).collect();
        assert_eq!(all, vec![Vec::<usize>::new()]);
    }
}
