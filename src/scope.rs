//! Per-iteration resource scopes.
//!
//! Every iteration acquires a fresh scope, resolves its work unit out of it
//! and releases the scope when the iteration ends. The scope owns whatever
//! the unit acquired, so releasing it is what makes iterations isolated from
//! each other.

use crate::work::WorkUnit;

/// Failure to resolve a work unit out of a scope.
///
/// This points at broken wiring, not at a transient iteration problem, so
/// the loop runners propagate it instead of containing it.
#[derive(Debug, thiserror::Error)]
#[error("cannot resolve work unit '{unit}': {reason}")]
pub struct ResolveError {
    pub unit: String,
    pub reason: String,
}

impl ResolveError {
    pub fn new(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}

/// An isolated resource boundary for exactly one iteration.
pub trait WorkScope: Send {
    /// Resolve the iteration's work unit. Called at most once per scope.
    fn resolve(&mut self) -> Result<Box<dyn WorkUnit>, ResolveError>;

    /// Tear the scope down. Called exactly once, on every exit path,
    /// including a failed [`resolve`](WorkScope::resolve).
    fn release(self: Box<Self>);
}

/// Creates one isolated scope per iteration.
///
/// A factory is shared by all iterations of a worker, and may be shared
/// across workers, so implementations carry no per-iteration state.
pub trait ScopeFactory: Send + Sync {
    /// Identity of the unit this factory resolves. Used in log lines, span
    /// fields and metric labels.
    fn unit_name(&self) -> &str;

    fn create_scope(&self) -> Box<dyn WorkScope>;
}

/// Construct-run-drop factory for hosts without a resolution container.
///
/// Each scope builds a fresh unit with the provided closure; releasing the
/// scope simply drops whatever the unit owned.
pub struct UnitFactory {
    name: &'static str,
    build: Box<dyn Fn() -> Box<dyn WorkUnit> + Send + Sync>,
}

impl UnitFactory {
    pub fn new<U, F>(name: &'static str, build: F) -> Self
    where
        U: WorkUnit + 'static,
        F: Fn() -> U + Send + Sync + 'static,
    {
        Self {
            name,
            build: Box::new(move || Box::new(build()) as Box<dyn WorkUnit>),
        }
    }
}

impl ScopeFactory for UnitFactory {
    fn unit_name(&self) -> &str {
        self.name
    }

    fn create_scope(&self) -> Box<dyn WorkScope> {
        Box::new(UnitScope {
            unit: Some((self.build)()),
            unit_name: self.name,
        })
    }
}

struct UnitScope {
    unit: Option<Box<dyn WorkUnit>>,
    unit_name: &'static str,
}

impl WorkScope for UnitScope {
    fn resolve(&mut self) -> Result<Box<dyn WorkUnit>, ResolveError> {
        self.unit.take().ok_or_else(|| {
            ResolveError::new(self.unit_name, "unit already resolved from this scope")
        })
    }

    fn release(self: Box<Self>) {}
}
