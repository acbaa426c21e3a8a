//! Periodic loop runner: one iteration per fixed period.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};

use crate::config::{OverlapPolicy, PeriodicConfig};
use crate::events::{self, TracingEvents, WorkerEvents, WorkerKind};
use crate::executor::ScopedExecutor;
use crate::metrics;
use crate::scope::{ResolveError, ScopeFactory};
use crate::timing;

const KIND: WorkerKind = WorkerKind::Periodic;

/// Runs its work unit on a fixed period until shutdown.
///
/// How the schedule reacts to an iteration outliving its period is chosen
/// by the configured [`OverlapPolicy`]; under either policy iteration
/// bodies are strictly serialized and never abandoned mid-run.
pub struct PeriodicWorker {
    executor: ScopedExecutor,
    config: PeriodicConfig,
    events: Arc<dyn WorkerEvents>,
}

impl PeriodicWorker {
    pub fn new(factory: Arc<dyn ScopeFactory>, config: PeriodicConfig) -> Self {
        Self {
            executor: ScopedExecutor::new(factory),
            config,
            events: Arc::new(TracingEvents),
        }
    }

    /// Replace the default tracing event sink.
    pub fn with_events(mut self, events: Arc<dyn WorkerEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn unit_name(&self) -> &str {
        self.executor.unit_name()
    }

    /// Run until the shutdown token fires.
    ///
    /// Only a resolution failure ends the loop with an error; iteration
    /// failures are contained and the schedule keeps going. Cancellation
    /// during the initial delay or between iterations exits cleanly without
    /// waiting out the rest of the period.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ResolveError> {
        let worker = self.executor.unit_name();

        if !self.config.initial_delay().is_zero() {
            self.events
                .initial_delay(KIND, worker, self.config.initial_delay());
            if !timing::sleep_unless_cancelled(self.config.initial_delay(), &shutdown).await {
                return Ok(());
            }
        }

        self.events.started(KIND, worker, Some(self.config.period()));
        metrics::set_worker_running(worker, KIND.label(), true);

        let result = match self.config.policy() {
            OverlapPolicy::WaitForTick => self.run_ticked(&shutdown).await,
            OverlapPolicy::RaceDelay => self.run_raced(&shutdown).await,
        };

        metrics::set_worker_running(worker, KIND.label(), false);
        if result.is_ok() {
            self.events.stopped(KIND, worker);
        }
        result
    }

    async fn run_ticked(&self, shutdown: &CancellationToken) -> Result<(), ResolveError> {
        let worker = self.executor.unit_name();
        let mut ticker = tokio::time::interval(self.config.period());
        // Skip the immediate first tick, the schedule starts one full
        // period out. Ticks missed while an iteration overruns are
        // delivered late rather than dropped.
        ticker.tick().await;

        while !shutdown.is_cancelled() {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_iteration(shutdown)
                        .instrument(info_span!("periodic_worker", worker))
                        .await?;
                }
                _ = shutdown.cancelled() => break,
            }
        }
        Ok(())
    }

    async fn run_raced(&self, shutdown: &CancellationToken) -> Result<(), ResolveError> {
        let worker = self.executor.unit_name();
        while !shutdown.is_cancelled() {
            // The timer leg is cut short by shutdown; the iteration leg
            // always runs to completion on its own.
            let timer = timing::sleep_unless_cancelled(self.config.period(), shutdown);
            let iteration = self
                .run_iteration(shutdown)
                .instrument(info_span!("periodic_worker", worker));
            let (_, iteration_result) = tokio::join!(timer, iteration);
            iteration_result?;
        }
        Ok(())
    }

    async fn run_iteration(&self, shutdown: &CancellationToken) -> Result<(), ResolveError> {
        let worker = self.executor.unit_name();
        self.events.iteration_started(KIND, worker);
        let report = self.executor.execute_one(shutdown).await?;
        events::report_iteration(self.events.as_ref(), KIND, worker, &report);
        Ok(())
    }
}
