//! Runs one isolated iteration: scope acquisition, unit resolution, timed
//! execution, guaranteed release.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::scope::{ResolveError, ScopeFactory};
use crate::work::IterationError;

/// What a single iteration produced: the unit's own outcome and the wall
/// time spent inside its run call. Scope acquisition and release are not
/// part of the measured time.
#[derive(Debug)]
pub struct IterationReport {
    pub outcome: Result<(), IterationError>,
    pub duration: Duration,
}

/// Executes one iteration at a time, each inside a fresh scope.
///
/// Iteration errors are returned in the report rather than handled here;
/// containment is the calling loop's job. Only a resolution failure is
/// propagated as an error.
pub struct ScopedExecutor {
    factory: Arc<dyn ScopeFactory>,
}

impl ScopedExecutor {
    pub fn new(factory: Arc<dyn ScopeFactory>) -> Self {
        Self { factory }
    }

    /// Identity of the unit this executor resolves.
    pub fn unit_name(&self) -> &str {
        self.factory.unit_name()
    }

    /// Run exactly one iteration in its own scope.
    ///
    /// The scope is released on every path. A resolution failure releases
    /// the scope and propagates; on all other paths the unit is dropped
    /// first, then the scope released, then the report returned.
    pub async fn execute_one(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<IterationReport, ResolveError> {
        let mut scope = self.factory.create_scope();

        let mut unit = match scope.resolve() {
            Ok(unit) => unit,
            Err(e) => {
                scope.release();
                return Err(e);
            }
        };

        let started = Instant::now();
        let outcome = unit.run(shutdown).await;
        let duration = started.elapsed();

        // The unit goes before the scope that resolved it.
        drop(unit);
        scope.release();

        Ok(IterationReport { outcome, duration })
    }
}
