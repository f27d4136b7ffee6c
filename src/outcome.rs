use serde::Serialize;

use crate::model::{Conflict, Effort, Strategy};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub strategy: Strategy,
    pub effort: Effort,
    pub conflict: Conflict,
}

/// What a solver run ends with.
///
/// `Infeasible` is a completed run in which no strategy fits the budget; `Cancelled`
/// means the run was stopped before it could decide anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Found(Solution),
    Infeasible,
    Cancelled,
}

impl Outcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            Outcome::Found(solution) => Some(solution),
            Outcome::Infeasible | Outcome::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Conflict reached, `+inf` when nothing was found.
    pub fn conflict(&self) -> Conflict {
        self.solution().map_or(f64::INFINITY, |solution| solution.conflict)
    }

    /// The `(strategy, effort, conflict)` triple; `None` for cancelled runs.
    pub fn into_parts(self) -> Option<(Option<Strategy>, Option<Effort>, Conflict)> {
        match self {
            Outcome::Found(Solution { strategy, effort, conflict }) => {
                Some((Some(strategy), Some(effort), conflict))
            }
            Outcome::Infeasible => Some((None, None, f64::INFINITY)),
            Outcome::Cancelled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_is_not_cancelled() {
        assert_eq!(Outcome::Infeasible.into_parts(), Some((None, None, f64::INFINITY)));
        assert_eq!(Outcome::Cancelled.into_parts(), None);
        assert!(Outcome::Cancelled.is_cancelled());
        assert!(!Outcome::Infeasible.is_cancelled());
    }

    #[test]
    fn found_exposes_its_solution() {
        let outcome = Outcome::Found(Solution { strategy: vec![0, 3], effort: 39, conflict: 12.5 });
        assert_eq!(outcome.conflict(), 12.5);
        assert_eq!(outcome.into_parts(), Some((Some(vec![0, 3]), Some(39), 12.5)));
    }

    #[test]
    fn serializes_with_status_tag() {
        let found = Outcome::Found(Solution { strategy: vec![1], effort: 2, conflict: 4.0 });
        let json = serde_json::to_value(found).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["effort"], 2);
        assert_eq!(serde_json::to_value(Outcome::Cancelled).unwrap()["status"], "cancelled");
    }
}
