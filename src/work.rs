//! The unit-of-work contract shared by both loop runners.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Outcome of a single iteration, as reported by the work unit itself.
#[derive(Debug, thiserror::Error)]
pub enum IterationError {
    /// The unit observed the shutdown signal and stopped early. This is a
    /// clean outcome, not a failure.
    #[error("iteration cancelled")]
    Cancelled,
    /// The iteration failed. The loop records it and keeps scheduling.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl IterationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IterationError::Cancelled)
    }
}

/// One unit of background work, executed once per loop iteration.
///
/// A fresh instance is resolved from a new scope for every iteration and
/// dropped when that iteration ends, so implementations never see two calls
/// to [`run`](WorkUnit::run) on the same instance and cannot carry state
/// across iterations.
#[async_trait]
pub trait WorkUnit: Send {
    /// Execute one iteration.
    ///
    /// The shutdown token is the loop's own signal, passed through so
    /// long-running work can bail out promptly and return
    /// [`IterationError::Cancelled`].
    async fn run(&mut self, shutdown: &CancellationToken) -> Result<(), IterationError>;
}
