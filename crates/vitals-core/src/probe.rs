//! The probe capability
//!
//! A probe is any named unit of work that asynchronously produces a
//! [`ProbeResult`]. The engine depends only on this trait, never on a
//! concrete probe type.

use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

use crate::name::ProbeName;
use crate::registry::ProbeRegistration;
use crate::result::{ProbeError, ProbeResult};

/// Per-invocation context handed to a probe
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext<'a> {
    registration: &'a ProbeRegistration,
    cancellation: &'a CancellationToken,
}

impl<'a> ProbeContext<'a> {
    pub fn new(registration: &'a ProbeRegistration, cancellation: &'a CancellationToken) -> Self {
        Self {
            registration,
            cancellation,
        }
    }

    /// Name the probe was registered under
    pub fn name(&self) -> &'a ProbeName {
        self.registration.name()
    }

    pub fn tags(&self) -> &'a BTreeSet<String> {
        self.registration.tags()
    }

    pub fn registration(&self) -> &'a ProbeRegistration {
        self.registration
    }

    /// Cancellation signal shared by the whole evaluation cycle
    ///
    /// Long-running probes should watch it; the engine never aborts a
    /// probe that is already running.
    pub fn cancellation(&self) -> &'a CancellationToken {
        self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Trait for health probes
///
/// Returning `Err` marks the probe as `Failed` and the cycle continues.
/// Returning a result whose status is `Unknown` is a contract violation
/// and aborts the whole cycle.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Perform the health check
    async fn check(&self, ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError>;
}

/// Adapter turning an async closure into a probe
///
/// The closure receives the cycle's cancellation token.
///
/// ```rust,ignore
/// let probe = probe_fn(|_cancel| async { Ok::<_, ProbeError>(ProbeResult::healthy()) });
/// ```
pub struct FnProbe<F> {
    f: F,
}

/// Build a probe from a closure returning a future
pub fn probe_fn<F, Fut>(f: F) -> FnProbe<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<ProbeResult, ProbeError>> + Send + 'static,
{
    FnProbe { f }
}

#[async_trait::async_trait]
impl<F, Fut> Probe for FnProbe<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<ProbeResult, ProbeError>> + Send + 'static,
{
    async fn check(&self, ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        (self.f)(ctx.cancellation().clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::HealthStatus;

    #[test]
    fn test_fn_probe_sees_cycle_token() {
        let probe = probe_fn(|cancel: CancellationToken| async move {
            if cancel.is_cancelled() {
                Ok::<_, ProbeError>(ProbeResult::unhealthy("cancelled"))
            } else {
                Ok(ProbeResult::healthy())
            }
        });
        let registration = ProbeRegistration::new("db", probe_fn(|_| async {
            Ok::<_, ProbeError>(ProbeResult::healthy())
        }))
        .with_tags(["ready"]);

        let token = CancellationToken::new();
        let ctx = ProbeContext::new(&registration, &token);
        assert_eq!(ctx.name().as_str(), "db");
        assert!(ctx.tags().contains("ready"));

        let result = tokio_test::block_on(probe.check(ctx)).unwrap();
        assert_eq!(result.status(), HealthStatus::Healthy);

        token.cancel();
        assert!(ctx.is_cancelled());
        let result = tokio_test::block_on(probe.check(ctx)).unwrap();
        assert_eq!(result.status(), HealthStatus::Unhealthy);
    }
}
