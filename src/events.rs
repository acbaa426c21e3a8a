//! Worker lifecycle events.
//!
//! The loop runners report every lifecycle point through a [`WorkerEvents`]
//! sink. The default sink writes structured log lines through `tracing`;
//! hosts with their own audit trail, and tests, can substitute a sink of
//! their own.

use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::executor::IterationReport;
use crate::metrics;
use crate::work::IterationError;

/// Which flavor of loop a worker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    Continuous,
    Periodic,
}

impl WorkerKind {
    /// Lowercase form used as a metric label value.
    pub fn label(self) -> &'static str {
        match self {
            WorkerKind::Continuous => "continuous",
            WorkerKind::Periodic => "periodic",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKind::Continuous => write!(f, "Continuous"),
            WorkerKind::Periodic => write!(f, "Periodic"),
        }
    }
}

/// Sink for worker lifecycle events.
///
/// One sink instance may serve many workers at once, so implementations
/// must tolerate concurrent calls.
pub trait WorkerEvents: Send + Sync {
    /// The worker is waiting out its initial delay before the first
    /// iteration.
    fn initial_delay(&self, kind: WorkerKind, worker: &str, delay: Duration);

    /// The worker entered its scheduling loop. Periodic workers report
    /// their period.
    fn started(&self, kind: WorkerKind, worker: &str, period: Option<Duration>);

    /// An iteration is about to resolve its unit and run.
    fn iteration_started(&self, kind: WorkerKind, worker: &str);

    /// An iteration completed normally.
    fn iteration_finished(&self, kind: WorkerKind, worker: &str, duration: Duration);

    /// An iteration ended early because shutdown was requested. A clean
    /// outcome, not a failure.
    fn iteration_cancelled(&self, kind: WorkerKind, worker: &str, duration: Duration);

    /// An iteration failed. The worker stays up and keeps scheduling.
    fn iteration_failed(
        &self,
        kind: WorkerKind,
        worker: &str,
        duration: Duration,
        error: &anyhow::Error,
    );

    /// The worker left its scheduling loop.
    fn stopped(&self, kind: WorkerKind, worker: &str);
}

/// Default sink: log lines through `tracing`, per-iteration chatter at
/// debug level, lifecycle and failures above it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl WorkerEvents for TracingEvents {
    fn initial_delay(&self, _kind: WorkerKind, worker: &str, delay: Duration) {
        info!("Worker {} waiting {:?} before its first iteration", worker, delay);
    }

    fn started(&self, kind: WorkerKind, worker: &str, period: Option<Duration>) {
        match period {
            Some(period) => info!("{} worker {} started (period {:?})", kind, worker, period),
            None => info!("{} worker {} started", kind, worker),
        }
    }

    fn iteration_started(&self, kind: WorkerKind, worker: &str) {
        debug!("{} worker {} starting an iteration", kind, worker);
    }

    fn iteration_finished(&self, kind: WorkerKind, worker: &str, duration: Duration) {
        debug!("{} worker {} finished an iteration in {:?}", kind, worker, duration);
    }

    fn iteration_cancelled(&self, kind: WorkerKind, worker: &str, duration: Duration) {
        info!(
            "{} worker {} iteration cancelled after {:?}",
            kind, worker, duration
        );
    }

    fn iteration_failed(
        &self,
        kind: WorkerKind,
        worker: &str,
        duration: Duration,
        error: &anyhow::Error,
    ) {
        error!(
            "{} worker {} iteration failed after {:?}: {:#}",
            kind, worker, duration, error
        );
    }

    fn stopped(&self, kind: WorkerKind, worker: &str) {
        info!("{} worker {} stopped", kind, worker);
    }
}

/// Fan a finished iteration out to the event sink and the metrics, keeping
/// the outcome contained. Shared by both loop runners.
pub(crate) fn report_iteration(
    events: &dyn WorkerEvents,
    kind: WorkerKind,
    worker: &str,
    report: &IterationReport,
) {
    match &report.outcome {
        Ok(()) => {
            events.iteration_finished(kind, worker, report.duration);
            metrics::record_iteration(worker, kind.label(), "success", report.duration);
        }
        Err(IterationError::Cancelled) => {
            events.iteration_cancelled(kind, worker, report.duration);
            metrics::record_iteration(worker, kind.label(), "cancelled", report.duration);
        }
        Err(IterationError::Failed(error)) => {
            events.iteration_failed(kind, worker, report.duration, error);
            metrics::record_iteration(worker, kind.label(), "failed", report.duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn kind_labels_and_display_forms() {
        assert_eq!(WorkerKind::Continuous.label(), "continuous");
        assert_eq!(WorkerKind::Periodic.label(), "periodic");
        assert_eq!(WorkerKind::Continuous.to_string(), "Continuous");
        assert_eq!(WorkerKind::Periodic.to_string(), "Periodic");
    }

    #[derive(Default)]
    struct RecordingEvents {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingEvents {
        fn push(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    impl WorkerEvents for RecordingEvents {
        fn initial_delay(&self, _kind: WorkerKind, _worker: &str, _delay: Duration) {
            self.push("initial_delay");
        }

        fn started(&self, _kind: WorkerKind, _worker: &str, _period: Option<Duration>) {
            self.push("started");
        }

        fn iteration_started(&self, _kind: WorkerKind, _worker: &str) {
            self.push("iteration_started");
        }

        fn iteration_finished(&self, _kind: WorkerKind, _worker: &str, _duration: Duration) {
            self.push("finished");
        }

        fn iteration_cancelled(&self, _kind: WorkerKind, _worker: &str, _duration: Duration) {
            self.push("cancelled");
        }

        fn iteration_failed(
            &self,
            _kind: WorkerKind,
            _worker: &str,
            _duration: Duration,
            error: &anyhow::Error,
        ) {
            self.push(&format!("failed: {}", error));
        }

        fn stopped(&self, _kind: WorkerKind, _worker: &str) {
            self.push("stopped");
        }
    }

    fn report(outcome: Result<(), IterationError>) -> IterationReport {
        IterationReport {
            outcome,
            duration: Duration::from_millis(5),
        }
    }

    #[test]
    fn a_successful_iteration_reports_as_finished() {
        let events = RecordingEvents::default();
        report_iteration(&events, WorkerKind::Continuous, "unit", &report(Ok(())));
        assert_eq!(*events.calls.lock().unwrap(), vec!["finished"]);
    }

    #[test]
    fn a_cancelled_iteration_reports_as_cancelled_not_failed() {
        let events = RecordingEvents::default();
        report_iteration(
            &events,
            WorkerKind::Periodic,
            "unit",
            &report(Err(IterationError::Cancelled)),
        );
        assert_eq!(*events.calls.lock().unwrap(), vec!["cancelled"]);
    }

    #[test]
    fn a_failed_iteration_reports_the_error() {
        let events = RecordingEvents::default();
        report_iteration(
            &events,
            WorkerKind::Continuous,
            "unit",
            &report(Err(anyhow::anyhow!("boom").into())),
        );
        assert_eq!(*events.calls.lock().unwrap(), vec!["failed: boom"]);
    }
}
