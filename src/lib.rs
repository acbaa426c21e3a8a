//! Background worker loops with per-iteration resource scopes.
//!
//! Two runners share one execution model: [`ContinuousWorker`] repeats its
//! work unit back-to-back, [`PeriodicWorker`] repeats it on a fixed period.
//! Every iteration resolves a fresh unit from an isolated scope and is
//! logged, traced and measured on its own; a failing iteration never stops
//! its loop, only shutdown does (or a resolution failure, which points at
//! broken wiring). [`WorkerPool`] wires workers into a host process and
//! joins them on shutdown.

pub mod config;
pub mod continuous;
pub mod events;
pub mod executor;
pub mod metrics;
pub mod periodic;
pub mod pool;
pub mod scope;
mod timing;
pub mod work;

// Re-export commonly used types for convenience
pub use config::{ContinuousConfig, OverlapPolicy, PeriodicConfig};
pub use continuous::ContinuousWorker;
pub use events::{TracingEvents, WorkerEvents, WorkerKind};
pub use executor::{IterationReport, ScopedExecutor};
pub use periodic::PeriodicWorker;
pub use pool::{WorkerInfo, WorkerPool};
pub use scope::{ResolveError, ScopeFactory, UnitFactory, WorkScope};
pub use work::{IterationError, WorkUnit};
