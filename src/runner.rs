//! Running solvers as background tasks.
//!
//! Every spawned solver gets its own [`SolveHandle`] holding the task and the
//! [`CancellationToken`] only its caller can set. A [`Batch`] groups one handle per
//! [`SolverKind`] so a caller can cancel or collect them by kind.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cancel::{CancellationToken, PollPolicy};
use crate::config::SolveConfig;
use crate::error::{ModerationError, RunError};
use crate::model::network::Network;
use crate::outcome::Outcome;
use crate::solver::SolverKind;

pub struct SolveHandle {
    kind: SolverKind,
    token: CancellationToken,
    task: JoinHandle<Result<Outcome, ModerationError>>,
}

/// Runs `kind` on tokio's blocking pool; the solvers are CPU bound.
pub fn spawn(kind: SolverKind, network: Arc<Network>, poll: PollPolicy) -> SolveHandle {
    let token = CancellationToken::new();
    let solver_token = token.clone();
    let task =
        tokio::task::spawn_blocking(move || kind.solver(poll).solve(&network, &solver_token));
    info!(solver = %kind, "solver spawned");
    SolveHandle { kind, token, task }
}

impl SolveHandle {
    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        info!(solver = %self.kind, "cancellation requested");
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> Result<Outcome, RunError> {
        let kind = self.kind;
        match self.task.await {
            Ok(Ok(outcome)) => {
                let cancelled = outcome.is_cancelled();
                info!(solver = %kind, cancelled, conflict = outcome.conflict(), "solver finished");
                Ok(outcome)
            }
            Ok(Err(source)) => Err(RunError::Moderation { kind, source }),
            Err(source) => Err(RunError::Join { kind, source }),
        }
    }
}

/// Caller-owned set of running solvers, at most one per kind.
#[derive(Default)]
pub struct Batch {
    handles: BTreeMap<SolverKind, SolveHandle>,
}

impl Batch {
    pub fn spawn_all(
        kinds: impl IntoIterator<Item = SolverKind>,
        network: Arc<Network>,
        poll: PollPolicy,
    ) -> Batch {
        let mut batch = Batch::default();
        for kind in kinds {
            batch.handles.entry(kind).or_insert_with(|| spawn(kind, Arc::clone(&network), poll));
        }
        batch
    }

    pub fn kinds(&self) -> impl Iterator<Item = SolverKind> + '_ {
        self.handles.keys().copied()
    }

    pub fn token(&self, kind: SolverKind) -> Option<&CancellationToken> {
        self.handles.get(&kind).map(SolveHandle::token)
    }

    /// Returns `false` when no solver of that kind is in the batch.
    pub fn cancel(&self, kind: SolverKind) -> bool {
        match self.handles.get(&kind) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        self.handles.values().for_each(SolveHandle::cancel);
    }

    /// Waits for every solver; results come back in [`SolverKind`] order.
    pub async fn join_all(self) -> Vec<(SolverKind, Result<Outcome, RunError>)> {
        let mut results = Vec::with_capacity(self.handles.len());
        for (kind, handle) in self.handles {
            results.push((kind, handle.join().await));
        }
        results
    }

    /// Like [`Batch::join_all`], cancelling whatever is still running once `timeout` elapses.
    pub async fn join_all_within(
        self,
        timeout: Duration,
    ) -> Vec<(SolverKind, Result<Outcome, RunError>)> {
        let tokens: Vec<(SolverKind, CancellationToken)> =
            self.handles.iter().map(|(kind, handle)| (*kind, handle.token.clone())).collect();
        let watchdog = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            for (kind, token) in tokens {
                let timeout_ms = timeout.as_millis() as u64;
                warn!(solver = %kind, timeout_ms, "time limit reached, cancelling");
                token.cancel();
            }
        });
        let results = self.join_all().await;
        watchdog.abort();
        results
    }
}

/// Spawns the configured solvers on `network` and waits for all of them.
pub async fn run(
    config: &SolveConfig,
    network: Network,
) -> Vec<(SolverKind, Result<Outcome, RunError>)> {
    let batch = Batch::spawn_all(config.selected(), Arc::new(network), config.poll);
    match config.timeout {
        Some(timeout) => batch.join_all_within(timeout).await,
        None => batch.join_all().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::group::Group;

    fn sample() -> Network {
        Network::new(
            vec![
                Group::new(7, 33.0, 62.0, 0.49).unwrap(),
                Group::new(11, -36.0, -1.0, 0.364).unwrap(),
                Group::new(12, 28.0, 27.0, 0.326).unwrap(),
            ],
            50,
        )
    }

    /// Far too many combinations for the exhaustive search to ever finish.
    fn huge() -> Network {
        let groups = (0..16).map(|i| Group::new(40, 0.0, 10.0 + i as f64, 0.01).unwrap()).collect();
        Network::new(groups, 1_000)
    }

    #[tokio::test]
    async fn runs_every_selected_solver() {
        let results = run(&SolveConfig::default(), sample()).await;
        let kinds: Vec<SolverKind> = results.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, SolverKind::ALL.to_vec());
        for (_, result) in results {
            assert!(matches!(result, Ok(Outcome::Found(_))));
        }
    }

    #[tokio::test]
    async fn cancelling_one_kind_leaves_the_others() {
        let batch = Batch::spawn_all(
            [SolverKind::Exhaustive, SolverKind::DynamicProgramming],
            Arc::new(huge()),
            PollPolicy::default(),
        );
        assert!(batch.cancel(SolverKind::Exhaustive));
        assert!(!batch.cancel(SolverKind::Greedy));
        let results = batch.join_all().await;
        assert!(matches!(results[0], (SolverKind::Exhaustive, Ok(Outcome::Cancelled))));
        assert!(matches!(results[1], (SolverKind::DynamicProgramming, Ok(Outcome::Found(_)))));
    }

    #[tokio::test]
    async fn cancel_all_reaches_every_solver() {
        let batch = Batch::spawn_all(SolverKind::ALL, Arc::new(huge()), PollPolicy::default());
        assert_eq!(batch.kinds().collect::<Vec<_>>(), SolverKind::ALL.to_vec());
        assert!(SolverKind::ALL.iter().all(|&kind| !batch.token(kind).unwrap().is_cancelled()));

        batch.cancel_all();
        for kind in SolverKind::ALL {
            assert!(batch.token(kind).unwrap().is_cancelled(), "{kind}");
        }

        let results = batch.join_all().await;
        assert!(matches!(results[0], (SolverKind::Exhaustive, Ok(Outcome::Cancelled))));
        // greedy and dp may finish before they next look at their token
        for (kind, result) in &results[1..] {
            assert!(matches!(result, Ok(Outcome::Cancelled | Outcome::Found(_))), "{kind}");
        }
    }

    #[tokio::test]
    async fn handle_finishes_once_cancelled() {
        let handle = spawn(SolverKind::Exhaustive, Arc::new(huge()), PollPolicy::default());
        assert_eq!(handle.kind(), SolverKind::Exhaustive);
        assert!(!handle.is_finished());

        handle.cancel();
        tokio::time::timeout(Duration::from_secs(10), async {
            while !handle.is_finished() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(handle.join().await.unwrap(), Outcome::Cancelled);
    }

    #[tokio::test]
    async fn timeout_cancels_long_runs() {
        let config = SolveConfig::default()
            .with_solvers([SolverKind::Exhaustive])
            .with_timeout(Some(Duration::from_millis(20)));
        let results = run(&config, huge()).await;
        assert!(matches!(results.as_slice(), [(SolverKind::Exhaustive, Ok(Outcome::Cancelled))]));
    }

    #[tokio::test]
    async fn handle_exposes_its_token() {
        let handle = spawn(SolverKind::Exhaustive, Arc::new(huge()), PollPolicy::default());
        let token = handle.token().clone();
        token.cancel();
        assert!(handle.token().is_cancelled());
        assert_eq!(handle.join().await.unwrap(), Outcome::Cancelled);
    }
}
