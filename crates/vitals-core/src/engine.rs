//! Health check engine
//!
//! Resolves the registered probes, runs them under a shared cancellation
//! signal, isolates failures and folds the outcomes into one composite result.

use futures::{FutureExt, StreamExt, TryStreamExt};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{EngineError, RegistryError, Result};
use crate::name::ProbeName;
use crate::probe::ProbeContext;
use crate::registry::{validate_unique_names, ProbeRegistration, ProbeSource};
use crate::result::{CompositeResult, ProbeResult};

/// Predicate selecting which registrations take part in a cycle
pub type ProbeFilter = dyn Fn(&ProbeRegistration) -> bool + Send + Sync;

/// How probes within one cycle are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// One probe at a time, in enumeration order
    #[default]
    Sequential,
    /// At most `max_in_flight` probes running at once
    Concurrent { max_in_flight: usize },
}

impl ExecutionMode {
    fn max_in_flight(&self) -> usize {
        match self {
            ExecutionMode::Sequential => 1,
            ExecutionMode::Concurrent { max_in_flight } => (*max_in_flight).max(1),
        }
    }
}

/// Panic payload captured from a probe, reported as its failure cause
#[derive(Debug, thiserror::Error)]
#[error("health check panicked: {message}")]
pub struct ProbePanic {
    pub message: String,
}

impl ProbePanic {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}

/// Health check engine
pub struct HealthCheckEngine {
    source: Arc<dyn ProbeSource>,
    mode: ExecutionMode,
}

impl std::fmt::Debug for HealthCheckEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCheckEngine")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl HealthCheckEngine {
    /// Create an engine over `source`, rejecting ambiguous probe sets up front
    pub fn new<S: ProbeSource + 'static>(source: S) -> std::result::Result<Self, RegistryError> {
        let source: Arc<dyn ProbeSource> = Arc::new(source);
        let registrations = source.registrations();
        validate_unique_names(&registrations)?;

        tracing::debug!(probes = registrations.len(), "Health check engine ready");

        Ok(Self {
            source,
            mode: ExecutionMode::default(),
        })
    }

    /// Set execution mode (builder pattern)
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Run every registered probe
    pub async fn run_all(&self, cancellation: &CancellationToken) -> Result<CompositeResult> {
        self.run(None, cancellation).await
    }

    /// Run one evaluation cycle
    ///
    /// Fails on cancellation and when a probe returns `Unknown`; otherwise
    /// always yields a composite result covering every selected probe.
    pub async fn run(
        &self,
        filter: Option<&ProbeFilter>,
        cancellation: &CancellationToken,
    ) -> Result<CompositeResult> {
        let start = Instant::now();

        let registrations = self.source.registrations();
        validate_unique_names(&registrations)?;

        let selected: Vec<ProbeRegistration> = match filter {
            Some(filter) => registrations.into_iter().filter(|r| filter(r)).collect(),
            None => registrations,
        };

        tracing::debug!(
            probes = selected.len(),
            mode = ?self.mode,
            "Running health checks"
        );

        // Outstanding probes observe this token; it fires when the cycle returns early.
        let cycle_token = cancellation.child_token();
        let _abort_outstanding = cycle_token.clone().drop_guard();

        let outcomes: Vec<(ProbeName, ProbeResult)> = match self.mode {
            ExecutionMode::Sequential => {
                let mut outcomes = Vec::with_capacity(selected.len());
                for registration in &selected {
                    outcomes.push(run_entry(registration, &cycle_token).await?);
                }
                outcomes
            }
            ExecutionMode::Concurrent { .. } => {
                // Built eagerly so the stream holds concrete futures, keeping `run` Send.
                let pending: Vec<_> = selected
                    .iter()
                    .map(|registration| run_entry(registration, &cycle_token))
                    .collect();
                futures::stream::iter(pending)
                    .buffer_unordered(self.mode.max_in_flight())
                    .try_collect::<Vec<_>>()
                    .await?
            }
        };

        let entries: BTreeMap<ProbeName, ProbeResult> = outcomes.into_iter().collect();
        let composite = CompositeResult::from_entries(entries, start.elapsed());

        tracing::debug!(
            status = %composite.status(),
            probes = composite.len(),
            elapsed_ms = composite.total_duration().as_millis() as u64,
            "Health check cycle complete"
        );

        Ok(composite)
    }
}

async fn run_entry(
    registration: &ProbeRegistration,
    cancellation: &CancellationToken,
) -> Result<(ProbeName, ProbeResult)> {
    let result = run_probe(registration, cancellation).await?;
    Ok((registration.name().clone(), result))
}

/// Invoke one probe and classify its outcome
///
/// Instantiation runs under the same panic guard as the check itself.
async fn run_probe(
    registration: &ProbeRegistration,
    cancellation: &CancellationToken,
) -> Result<ProbeResult> {
    if cancellation.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let name = registration.name();
    let span = tracing::info_span!(
        "health_probe",
        probe_name = %name,
        tags = ?registration.tags()
    );

    async move {
        let start = Instant::now();
        tracing::debug!("Running health check");

        let outcome = AssertUnwindSafe(async {
            let probe = registration.instantiate();
            probe.check(ProbeContext::new(registration, cancellation)).await
        })
        .catch_unwind()
        .await;
        let elapsed = start.elapsed();

        let result = match outcome {
            Ok(Ok(result)) if result.status().is_unknown() => {
                tracing::error!("Health check returned Unknown status");
                return Err(EngineError::ContractViolation {
                    probe: name.to_string(),
                });
            }
            Ok(Ok(result)) => result,
            Ok(Err(_)) if cancellation.is_cancelled() => {
                tracing::debug!("Health check stopped by cancellation");
                return Err(EngineError::Cancelled);
            }
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "Health check failed");
                ProbeResult::failed(error)
            }
            Err(payload) => {
                let panic = ProbePanic::from_payload(payload);
                tracing::error!(panic = %panic.message, "Health check panicked");
                ProbeResult::failed(panic)
            }
        };

        tracing::debug!(
            status = %result.status(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Health check completed"
        );

        Ok(result.with_duration(elapsed).with_tags(registration.tags()))
    }
    .instrument(span)
    .await
}
