//! Shared helpers for the end-to-end worker tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use worker_loops::{IterationError, UnitFactory, WorkUnit, WorkerEvents, WorkerKind};

/// Event sink that counts every lifecycle call it receives.
#[derive(Default)]
pub struct CountingEvents {
    started: AtomicUsize,
    stopped: AtomicUsize,
    finished: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl CountingEvents {
    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped_count(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl WorkerEvents for CountingEvents {
    fn initial_delay(&self, _kind: WorkerKind, _worker: &str, _delay: Duration) {}

    fn started(&self, _kind: WorkerKind, _worker: &str, _period: Option<Duration>) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn iteration_started(&self, _kind: WorkerKind, _worker: &str) {}

    fn iteration_finished(&self, _kind: WorkerKind, _worker: &str, _duration: Duration) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn iteration_cancelled(&self, _kind: WorkerKind, _worker: &str, _duration: Duration) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
    }

    fn iteration_failed(
        &self,
        _kind: WorkerKind,
        _worker: &str,
        _duration: Duration,
        _error: &anyhow::Error,
    ) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn stopped(&self, _kind: WorkerKind, _worker: &str) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Work unit that counts its runs and paces itself so continuous loops do
/// not busy-spin. Shutdown interrupts the pacing sleep.
struct PacedUnit {
    runs: Arc<AtomicUsize>,
    pause: Duration,
    fail: bool,
}

#[async_trait]
impl WorkUnit for PacedUnit {
    async fn run(&mut self, shutdown: &CancellationToken) -> Result<(), IterationError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow::anyhow!("induced failure").into());
        }
        if self.pause.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(self.pause) => Ok(()),
            _ = shutdown.cancelled() => Err(IterationError::Cancelled),
        }
    }
}

pub fn paced_factory(
    name: &'static str,
    runs: Arc<AtomicUsize>,
    pause: Duration,
) -> Arc<UnitFactory> {
    Arc::new(UnitFactory::new(name, move || PacedUnit {
        runs: runs.clone(),
        pause,
        fail: false,
    }))
}

pub fn failing_factory(name: &'static str, runs: Arc<AtomicUsize>) -> Arc<UnitFactory> {
    Arc::new(UnitFactory::new(name, move || PacedUnit {
        runs: runs.clone(),
        pause: Duration::ZERO,
        fail: true,
    }))
}
