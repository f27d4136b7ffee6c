use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag. The orchestrator sets it; solvers only read it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// How many units of work a solver performs between two looks at its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub every: NonZeroUsize,
}

impl PollPolicy {
    pub const DEFAULT_EVERY: usize = 256;

    pub fn every(units: NonZeroUsize) -> Self {
        PollPolicy { every: units }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy::every(NonZeroUsize::new(Self::DEFAULT_EVERY).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Counts units of work and consults the token on the first unit and every `every` units after.
///
/// Solvers also call [`Poller::cancelled`] once before any work, so a run with nothing to
/// iterate over still reports a token set beforehand.
pub(crate) struct Poller<'a> {
    token: &'a CancellationToken,
    every: usize,
    units: usize,
}

impl<'a> Poller<'a> {
    pub(crate) fn new(token: &'a CancellationToken, policy: PollPolicy) -> Self {
        Poller { token, every: policy.every.get(), units: 0 }
    }

    /// Records one unit of work; `true` means the caller must stop.
    pub(crate) fn tick(&mut self) -> bool {
        let due = self.units % self.every == 0;
        self.units = self.units.wrapping_add(1);
        due && self.token.is_cancelled()
    }

    /// Looks at the token now, off the schedule and without counting a unit.
    pub(crate) fn cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn units(&self) -> usize {
        self.units
    }
}
