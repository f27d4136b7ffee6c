use thiserror::Error;

use crate::model::Index;
use crate::solver::SolverKind;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModerationError {
    #[error("cannot moderate {requested} agents in a group of {available}")]
    ExceedsCount { requested: usize, available: usize },
    #[error("strategy has {found} entries but the network has {expected} groups")]
    LengthMismatch { expected: usize, found: usize },
    #[error("invalid group: {reason}")]
    InvalidGroup { reason: String },
    #[error("group {group_index}: {source}")]
    AtGroup {
        group_index: Index,
        #[source]
        source: Box<ModerationError>,
    },
}

impl ModerationError {
    pub(crate) fn at_group(self, group_index: Index) -> Self {
        ModerationError::AtGroup { group_index, source: Box::new(self) }
    }
}

/// Failures of a solver run driven through [`crate::runner`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("{kind} solver failed: {source}")]
    Moderation {
        kind: SolverKind,
        #[source]
        source: ModerationError,
    },
    #[error("{kind} solver task did not complete: {source}")]
    Join {
        kind: SolverKind,
        #[source]
        source: tokio::task::JoinError,
    },
}
