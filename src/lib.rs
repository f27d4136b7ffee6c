//! Allocating a bounded moderation effort across opinion groups so that the
//! network's internal conflict is as small as possible.
//!
//! A [`Network`] holds the groups and the budget. Three [`Solver`]s answer the same
//! question with different trade-offs:
//!
//! * [`Exhaustive`] tries every strategy; exact, exponential.
//! * [`Greedy`] moderates one agent at a time by best benefit/cost ratio; fast, not optimal.
//! * [`DynamicProgramming`] folds groups into a frontier keyed by exact cost; exact and
//!   bounded by the budget.
//!
//! Every solver takes a [`CancellationToken`] and returns [`Outcome::Cancelled`] instead
//! of a partial answer when it is set.

pub mod cancel;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod exhaustive;
pub mod greedy;
pub mod io;
pub mod logging;
pub mod model;
pub mod outcome;
pub mod runner;
pub mod solver;

pub use cancel::{CancellationToken, PollPolicy};
pub use config::SolveConfig;
pub use dynamic::DynamicProgramming;
pub use error::{ModerationError, RunError};
pub use exhaustive::Exhaustive;
pub use greedy::Greedy;
pub use model::group::Group;
pub use model::network::Network;
pub use model::strategy::StrategyEnumerator;
pub use model::{Conflict, Effort, Index, Strategy};
pub use outcome::{Outcome, Solution};
pub use solver::{Solver, SolverKind};
