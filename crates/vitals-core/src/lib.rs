//! Vitals Core
//!
//! Health check execution and aggregation: answers "is this process healthy,
//! and why?" by running independently registered probes and reducing them to
//! a single composite verdict plus per-probe detail.
//!
//! ## Architecture
//!
//! 1. **Probes** (`probe`): the [`Probe`] trait every check implements.
//! 2. **Registry** (`registry`): registrations (name, tags, per-cycle factory),
//!    the [`ProbeSource`] seam and duplicate-name validation.
//! 3. **Engine** (`engine`): runs one evaluation cycle under a cancellation token.
//! 4. **Aggregation** (`aggregate`): the worst single status wins.
//!
//! ## Failure semantics
//!
//! - A probe returning `Err` or panicking is recorded as `Failed`; the cycle continues.
//! - A probe returning `Unknown` aborts the cycle with [`EngineError::ContractViolation`].
//! - Cancellation aborts the cycle with [`EngineError::Cancelled`]; no partial result.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vitals_core::{
//!     CancellationToken, HealthCheckEngine, HealthStatus, Probe, ProbeContext, ProbeError,
//!     ProbeRegistry, ProbeResult,
//! };
//!
//! struct CacheProbe;
//!
//! #[async_trait::async_trait]
//! impl Probe for CacheProbe {
//!     async fn check(&self, _ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
//!         Ok(ProbeResult::degraded("cold cache").with_data("hit_ratio", 0.12))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = ProbeRegistry::new().with_probe("cache", CacheProbe);
//!
//!     let engine = HealthCheckEngine::new(registry).unwrap();
//!     let report = engine.run_all(&CancellationToken::new()).await.unwrap();
//!
//!     assert_eq!(report.status(), HealthStatus::Degraded);
//! }
//! ```

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod name;
pub mod probe;
pub mod registry;
pub mod result;
pub mod status;

pub use aggregate::{aggregate_status, worst_of};
pub use engine::{ExecutionMode, HealthCheckEngine, ProbeFilter, ProbePanic};
pub use error::{EngineError, RegistryError};
pub use name::ProbeName;
pub use probe::{probe_fn, FnProbe, Probe, ProbeContext};
pub use registry::{
    duplicate_names, validate_unique_names, ProbeRegistration, ProbeRegistry, ProbeSource,
};
pub use result::{CompositeResult, ProbeError, ProbeFailure, ProbeResult};
pub use status::{HealthStatus, ParseStatusError};

pub use tokio_util::sync::CancellationToken;
