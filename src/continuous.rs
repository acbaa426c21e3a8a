//! Continuous loop runner: back-to-back iterations until shutdown.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};

use crate::config::ContinuousConfig;
use crate::events::{self, TracingEvents, WorkerEvents, WorkerKind};
use crate::executor::ScopedExecutor;
use crate::metrics;
use crate::scope::{ResolveError, ScopeFactory};
use crate::timing;

const KIND: WorkerKind = WorkerKind::Continuous;

/// Runs its work unit back-to-back in an unbounded loop, checking the
/// shutdown token between iterations.
///
/// An iteration that fails is recorded and the loop keeps going; an
/// in-flight iteration is never abandoned, it observes the shutdown token
/// itself and the loop exits at the next check.
pub struct ContinuousWorker {
    executor: ScopedExecutor,
    config: ContinuousConfig,
    events: Arc<dyn WorkerEvents>,
}

impl ContinuousWorker {
    pub fn new(factory: Arc<dyn ScopeFactory>, config: ContinuousConfig) -> Self {
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
    /// failures are contained. Cancellation during the initial delay exits
    /// cleanly before the first iteration.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ResolveError> {
        let worker = self.executor.unit_name();

        if !self.config.initial_delay().is_zero() {
            self.events
                .initial_delay(KIND, worker, self.config.initial_delay());
            if !timing::sleep_unless_cancelled(self.config.initial_delay(), &shutdown).await {
                return Ok(());
            }
        }

        self.events.started(KIND, worker, None);
        metrics::set_worker_running(worker, KIND.label(), true);

        let result = self.run_loop(&shutdown).await;

        metrics::set_worker_running(worker, KIND.label(), false);
        if result.is_ok() {
            self.events.stopped(KIND, worker);
        }
        result
    }

    async fn run_loop(&self, shutdown: &CancellationToken) -> Result<(), ResolveError> {
        let worker = self.executor.unit_name();
        while !shutdown.is_cancelled() {
            self.run_iteration(shutdown)
                .instrument(info_span!("continuous_worker", worker))
                .await?;
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
