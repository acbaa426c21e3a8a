//! Managed registration of workers against one shared shutdown signal.
//!
//! The pool is composition-root glue: it pairs a scope factory with a
//! schedule, spawns the matching loop runner as a background task and joins
//! everything on shutdown.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{ContinuousConfig, PeriodicConfig};
use crate::continuous::ContinuousWorker;
use crate::events::{WorkerEvents, WorkerKind};
use crate::periodic::PeriodicWorker;
use crate::scope::{ResolveError, ScopeFactory};

const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Static description of a registered worker, for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerInfo {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_delay_ms: Option<u64>,
}

struct RegisteredWorker {
    info: WorkerInfo,
    handle: JoinHandle<Result<(), ResolveError>>,
}

/// Spawns loop runners and joins them on shutdown.
///
/// Every worker observes the pool's shutdown token; cancelling it (directly
/// or through [`shutdown`](WorkerPool::shutdown)) stops them all.
pub struct WorkerPool {
    shutdown: CancellationToken,
    workers: Vec<RegisteredWorker>,
    events: Option<Arc<dyn WorkerEvents>>,
    shutdown_grace: Duration,
}

impl WorkerPool {
    /// Pool with its own root token.
    pub fn new() -> Self {
        Self::with_shutdown_token(CancellationToken::new())
    }

    /// Pool driven by an externally owned token, typically the host's
    /// signal handler. [`shutdown`](WorkerPool::shutdown) cancels it too.
    pub fn with_shutdown_token(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            workers: Vec::new(),
            events: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Event sink handed to workers registered after this call. Without it
    /// workers log through the default tracing sink.
    pub fn with_events(mut self, events: Arc<dyn WorkerEvents>) -> Self {
        self.events = Some(events);
        self
    }

    /// How long [`shutdown`](WorkerPool::shutdown) waits for each worker.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// The token observed by every worker in this pool.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register a continuous worker and start it immediately.
    pub fn register_continuous(
        &mut self,
        factory: Arc<dyn ScopeFactory>,
        config: ContinuousConfig,
    ) {
        let info = WorkerInfo {
            name: factory.unit_name().to_string(),
            kind: WorkerKind::Continuous.label().to_string(),
            period_ms: None,
            initial_delay_ms: duration_ms(config.initial_delay()),
        };
        info!("Registering continuous worker {}", info.name);

        let mut worker = ContinuousWorker::new(factory, config);
        if let Some(events) = &self.events {
            worker = worker.with_events(Arc::clone(events));
        }
        let handle = tokio::spawn(worker.run(self.shutdown.clone()));
        self.workers.push(RegisteredWorker { info, handle });
    }

    /// Register a periodic worker and start it immediately.
    pub fn register_periodic(&mut self, factory: Arc<dyn ScopeFactory>, config: PeriodicConfig) {
        let info = WorkerInfo {
            name: factory.unit_name().to_string(),
            kind: WorkerKind::Periodic.label().to_string(),
            period_ms: duration_ms(config.period()),
            initial_delay_ms: duration_ms(config.initial_delay()),
        };
        info!(
            "Registering periodic worker {} (period {:?})",
            info.name,
            config.period()
        );

        let mut worker = PeriodicWorker::new(factory, config);
        if let Some(events) = &self.events {
            worker = worker.with_events(Arc::clone(events));
        }
        let handle = tokio::spawn(worker.run(self.shutdown.clone()));
        self.workers.push(RegisteredWorker { info, handle });
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn workers(&self) -> Vec<WorkerInfo> {
        self.workers.iter().map(|w| w.info.clone()).collect()
    }

    /// Cancel the shutdown token and join every worker.
    ///
    /// Each worker gets up to the grace period to wind down. A worker that
    /// panicked or overstays the grace period is logged and skipped; the
    /// first resolution error is returned so hosts surface broken wiring.
    pub async fn shutdown(self) -> Result<(), ResolveError> {
        info!("Shutting down worker pool ({} workers)", self.workers.len());
        self.shutdown.cancel();

        let mut first_error: Option<ResolveError> = None;
        for worker in self.workers {
            let name = worker.info.name;
            match tokio::time::timeout(self.shutdown_grace, worker.handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    error!("Worker {} ended with a resolution error: {}", name, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Ok(Err(join_error)) => {
                    error!("Worker {} panicked: {}", name, join_error);
                }
                Err(_) => {
                    warn!(
                        "Worker {} did not stop within {:?}",
                        name, self.shutdown_grace
                    );
                }
            }
        }

        info!("Worker pool shutdown complete");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_ms(duration: Duration) -> Option<u64> {
    if duration.is_zero() {
        None
    } else {
        Some(duration.as_millis() as u64)
    }
}
