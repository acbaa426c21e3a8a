//! Schedule configuration for the two loop runners.

use std::time::Duration;

use anyhow::{bail, Result};

/// How a periodic worker lines its iterations up against the period timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Iterations start on tick arrival. The tick source fires every period,
    /// starting one full period after the loop enters its schedule. An
    /// iteration that overruns its period delays the next iteration but the
    /// pending tick is not skipped, so starts compress until the schedule
    /// realigns.
    #[default]
    WaitForTick,
    /// Each cycle runs the iteration together with a period-long timer and
    /// advances once both are done, so consecutive starts are separated by
    /// the larger of the period and the iteration's own duration. Iteration
    /// bodies remain strictly serialized.
    RaceDelay,
}

/// Configuration for a continuous worker.
#[derive(Debug, Clone, Default)]
pub struct ContinuousConfig {
    initial_delay: Duration,
}

impl ContinuousConfig {
    /// No initial delay: the first iteration starts immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait once before the first iteration. The wait is cut short by
    /// shutdown.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }
}

/// Configuration for a periodic worker.
#[derive(Debug, Clone)]
pub struct PeriodicConfig {
    period: Duration,
    initial_delay: Duration,
    policy: OverlapPolicy,
}

impl PeriodicConfig {
    /// Schedule one iteration per `period`, with no initial delay and the
    /// default [`OverlapPolicy::WaitForTick`] policy. A zero period is
    /// rejected.
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            bail!("periodic worker period must be greater than zero");
        }
        Ok(Self {
            period,
            initial_delay: Duration::ZERO,
            policy: OverlapPolicy::default(),
        })
    }

    /// Wait once before entering the periodic schedule. The wait is cut
    /// short by shutdown.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_policy(mut self, policy: OverlapPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }
}
