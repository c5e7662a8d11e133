//! Integration tests for the health check engine
//!
//! Covers:
//! - Aggregation scenarios over registered probes
//! - Failure isolation and contract violations
//! - Filtering and cancellation
//! - Per-cycle probe resolution and concurrent execution

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vitals_core::{
    CancellationToken, EngineError, ExecutionMode, HealthCheckEngine, HealthStatus, Probe,
    ProbeContext, ProbeError, ProbePanic, ProbeRegistration, ProbeRegistry, ProbeResult,
    ProbeSource, RegistryError,
};

/// Probe that always reports the same status
struct FixedProbe(HealthStatus);

#[async_trait::async_trait]
impl Probe for FixedProbe {
    async fn check(&self, _ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        Ok(ProbeResult::new(self.0))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("connection pool exhausted")]
struct PoolExhausted;

/// Probe that raises an error
struct FailingProbe;

#[async_trait::async_trait]
impl Probe for FailingProbe {
    async fn check(&self, _ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        Err(Box::new(PoolExhausted))
    }
}

/// Probe that panics mid-check
struct PanickingProbe;

#[async_trait::async_trait]
impl Probe for PanickingProbe {
    async fn check(&self, _ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        panic!("index out of bounds");
    }
}

/// Probe that records the order in which probes ran
struct RecordingProbe {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl Probe for RecordingProbe {
    async fn check(&self, ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        self.log.lock().unwrap().push(ctx.name().to_string());
        Ok(ProbeResult::healthy())
    }
}

/// Probe that cancels the caller's token while it runs
struct CancellingProbe(CancellationToken);

#[async_trait::async_trait]
impl Probe for CancellingProbe {
    async fn check(&self, _ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        self.0.cancel();
        Ok(ProbeResult::healthy())
    }
}

/// Probe that waits for cancellation and then gives up
struct WaitForCancelProbe {
    observed: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Probe for WaitForCancelProbe {
    async fn check(&self, ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        ctx.cancellation().cancelled().await;
        self.observed.fetch_add(1, Ordering::SeqCst);
        Err("operation cancelled".into())
    }
}

fn fixed(statuses: &[(&str, HealthStatus)]) -> ProbeRegistry {
    statuses
        .iter()
        .fold(ProbeRegistry::new(), |registry, (name, status)| {
            registry.with_probe(*name, FixedProbe(*status))
        })
}

async fn run_all(registry: ProbeRegistry) -> Result<vitals_core::CompositeResult, EngineError> {
    HealthCheckEngine::new(registry)
        .unwrap()
        .run_all(&CancellationToken::new())
        .await
}

#[tokio::test]
async fn test_no_probes_is_healthy() {
    let composite = run_all(ProbeRegistry::new()).await.unwrap();
    assert_eq!(composite.status(), HealthStatus::Healthy);
    assert!(composite.is_empty());
}

#[tokio::test]
async fn test_degraded_scenario() {
    let composite = run_all(fixed(&[
        ("Foo", HealthStatus::Healthy),
        ("Bar", HealthStatus::Degraded),
        ("Baz", HealthStatus::Healthy),
    ]))
    .await
    .unwrap();

    assert_eq!(composite.status(), HealthStatus::Degraded);
    assert_eq!(composite.len(), 3);
    assert_eq!(composite.get("bar").unwrap().status(), HealthStatus::Degraded);
}

#[tokio::test]
async fn test_unhealthy_scenario() {
    let composite = run_all(fixed(&[
        ("Foo", HealthStatus::Healthy),
        ("Bar", HealthStatus::Unhealthy),
        ("Baz", HealthStatus::Healthy),
    ]))
    .await
    .unwrap();

    assert_eq!(composite.status(), HealthStatus::Unhealthy);
}

#[tokio::test]
async fn test_filter_excludes_probe() {
    let engine = HealthCheckEngine::new(fixed(&[
        ("Foo", HealthStatus::Healthy),
        ("Bar", HealthStatus::Unhealthy),
        ("Baz", HealthStatus::Healthy),
    ]))
    .unwrap();

    let not_bar = |registration: &ProbeRegistration| !registration.name().matches("Bar");
    let composite = engine
        .run(Some(&not_bar), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(composite.status(), HealthStatus::Healthy);
    let names: Vec<_> = composite.iter().map(|(name, _)| name.to_string()).collect();
    assert_eq!(names, vec!["Baz", "Foo"]);
}

#[tokio::test]
async fn test_filter_by_tag() {
    let registry = ProbeRegistry::new()
        .with_registration(
            ProbeRegistration::new("process", FixedProbe(HealthStatus::Healthy))
                .with_tags(["live"]),
        )
        .with_registration(
            ProbeRegistration::new("database", FixedProbe(HealthStatus::Unhealthy))
                .with_tags(["ready"]),
        );
    let engine = HealthCheckEngine::new(registry).unwrap();
    let token = CancellationToken::new();

    let live = |r: &ProbeRegistration| r.has_tag("live");
    let ready = |r: &ProbeRegistration| r.has_tag("ready");

    let liveness = engine.run(Some(&live), &token).await.unwrap();
    assert_eq!(liveness.status(), HealthStatus::Healthy);
    assert_eq!(liveness.len(), 1);

    let readiness = engine.run(Some(&ready), &token).await.unwrap();
    assert_eq!(readiness.status(), HealthStatus::Unhealthy);
    assert!(readiness.get("database").unwrap().tags().contains("ready"));
}

#[tokio::test]
async fn test_failing_probe_is_isolated() {
    let registry = fixed(&[("Foo", HealthStatus::Healthy), ("Baz", HealthStatus::Degraded)])
        .with_probe("Bar", FailingProbe);

    let composite = run_all(registry).await.unwrap();

    assert_eq!(composite.status(), HealthStatus::Failed);
    assert_eq!(composite.len(), 3);

    let bar = composite.get("Bar").unwrap();
    assert_eq!(bar.status(), HealthStatus::Failed);
    assert_eq!(bar.description(), Some("connection pool exhausted"));
    assert!(bar.error().unwrap().downcast_ref::<PoolExhausted>().is_some());

    assert_eq!(composite.get("Foo").unwrap().status(), HealthStatus::Healthy);
    assert_eq!(composite.get("Baz").unwrap().status(), HealthStatus::Degraded);
}

#[tokio::test]
async fn test_panicking_probe_is_isolated() {
    let registry = fixed(&[("Foo", HealthStatus::Healthy)]).with_probe("Bar", PanickingProbe);

    let composite = run_all(registry).await.unwrap();

    let bar = composite.get("Bar").unwrap();
    assert_eq!(bar.status(), HealthStatus::Failed);
    let panic = bar.error().unwrap().downcast_ref::<ProbePanic>().unwrap();
    assert_eq!(panic.message, "index out of bounds");
    assert_eq!(composite.get("Foo").unwrap().status(), HealthStatus::Healthy);
}

#[tokio::test]
async fn test_unknown_status_is_contract_violation() {
    let registry = fixed(&[
        ("Foo", HealthStatus::Healthy),
        ("Bar", HealthStatus::Unknown),
        ("Baz", HealthStatus::Healthy),
    ]);

    let err = run_all(registry).await.unwrap_err();
    assert!(matches!(err, EngineError::ContractViolation { .. }));
    assert_eq!(err.offending_probe(), Some("Bar"));
}

#[tokio::test]
async fn test_contract_violation_stops_remaining_probes() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = ProbeRegistry::new()
        .with_probe("first", RecordingProbe { log: log.clone() })
        .with_probe("broken", FixedProbe(HealthStatus::Unknown))
        .with_probe("never", RecordingProbe { log: log.clone() });

    assert!(run_all(registry).await.is_err());
    assert_eq!(*log.lock().unwrap(), vec!["first".to_string()]);
}

#[tokio::test]
async fn test_probes_run_in_enumeration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = ["zeta", "alpha", "mu"]
        .iter()
        .fold(ProbeRegistry::new(), |registry, name| {
            registry.with_probe(*name, RecordingProbe { log: log.clone() })
        });

    run_all(registry).await.unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["zeta", "alpha", "mu"]);
}

#[tokio::test]
async fn test_cancelled_before_start_produces_no_result() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = ProbeRegistry::new().with_probe("only", RecordingProbe { log: log.clone() });
    let engine = HealthCheckEngine::new(registry).unwrap();

    let token = CancellationToken::new();
    token.cancel();

    let err = engine.run_all(&token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancellation_between_probes_stops_cycle() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let token = CancellationToken::new();
    let registry = ProbeRegistry::new()
        .with_probe("canceller", CancellingProbe(token.clone()))
        .with_probe("after", RecordingProbe { log: log.clone() });
    let engine = HealthCheckEngine::new(registry).unwrap();

    let err = engine.run_all(&token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_probe_error_under_cancellation_propagates() {
    let observed = Arc::new(AtomicUsize::new(0));
    let registry = ProbeRegistry::new().with_probe(
        "waiter",
        WaitForCancelProbe {
            observed: observed.clone(),
        },
    );
    let engine = HealthCheckEngine::new(registry).unwrap();
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let err = engine.run_all(&token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_duplicate_names_fail_fast() {
    let registry = fixed(&[
        ("Foo", HealthStatus::Healthy),
        ("foo", HealthStatus::Healthy),
        ("Bar", HealthStatus::Healthy),
    ]);

    let err = HealthCheckEngine::new(registry).unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateNames {
            names: vec!["Foo".to_string(), "foo".to_string()]
        }
    );
}

/// Source whose probe set can change between cycles
#[derive(Default)]
struct DynamicSource {
    registrations: Mutex<Vec<ProbeRegistration>>,
}

impl ProbeSource for DynamicSource {
    fn registrations(&self) -> Vec<ProbeRegistration> {
        self.registrations.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn test_probe_set_resolved_every_cycle() {
    let source = Arc::new(DynamicSource::default());
    let engine = HealthCheckEngine::new(source.clone()).unwrap();
    let token = CancellationToken::new();

    assert!(engine.run_all(&token).await.unwrap().is_empty());

    source
        .registrations
        .lock()
        .unwrap()
        .push(ProbeRegistration::new("late", FixedProbe(HealthStatus::Degraded)));

    let composite = engine.run_all(&token).await.unwrap();
    assert_eq!(composite.status(), HealthStatus::Degraded);

    source
        .registrations
        .lock()
        .unwrap()
        .push(ProbeRegistration::new("LATE", FixedProbe(HealthStatus::Healthy)));

    let err = engine.run_all(&token).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidProbeSet(_)));
}

#[tokio::test]
async fn test_factory_instantiated_once_per_cycle() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let registry = ProbeRegistry::new().with_registration(ProbeRegistration::from_factory(
        "scoped",
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(FixedProbe(HealthStatus::Healthy)) as Arc<dyn Probe>
        },
    ));
    let engine = HealthCheckEngine::new(registry).unwrap();
    let token = CancellationToken::new();

    engine.run_all(&token).await.unwrap();
    engine.run_all(&token).await.unwrap();
    assert_eq!(created.load(Ordering::SeqCst), 2);
}

/// Probe that tracks how many instances run at the same time
struct GaugeProbe {
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Probe for GaugeProbe {
    async fn check(&self, _ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ProbeResult::healthy())
    }
}

#[tokio::test]
async fn test_concurrent_mode_is_bounded() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let registry = (0..6).fold(ProbeRegistry::new(), |registry, i| {
        registry.with_probe(
            format!("probe-{}", i),
            GaugeProbe {
                in_flight: in_flight.clone(),
                peak: peak.clone(),
            },
        )
    });

    let engine = HealthCheckEngine::new(registry)
        .unwrap()
        .with_execution_mode(ExecutionMode::Concurrent { max_in_flight: 2 });

    let composite = engine.run_all(&CancellationToken::new()).await.unwrap();
    assert_eq!(composite.len(), 6);
    assert_eq!(composite.status(), HealthStatus::Healthy);
    assert_eq!(peak.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_mode_isolates_failures() {
    let registry = fixed(&[("Foo", HealthStatus::Healthy), ("Baz", HealthStatus::Degraded)])
        .with_probe("Bar", FailingProbe)
        .with_probe("Qux", PanickingProbe);

    let engine = HealthCheckEngine::new(registry)
        .unwrap()
        .with_execution_mode(ExecutionMode::Concurrent { max_in_flight: 4 });

    let composite = engine.run_all(&CancellationToken::new()).await.unwrap();
    assert_eq!(composite.len(), 4);
    assert_eq!(composite.status(), HealthStatus::Failed);
    assert_eq!(composite.get("Qux").unwrap().status(), HealthStatus::Failed);
}

/// Probe that keeps a handle on its token and waits for it to fire
struct ParkedProbe {
    token: Arc<Mutex<Option<CancellationToken>>>,
}

#[async_trait::async_trait]
impl Probe for ParkedProbe {
    async fn check(&self, ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        *self.token.lock().unwrap() = Some(ctx.cancellation().clone());
        ctx.cancellation().cancelled().await;
        Err("operation cancelled".into())
    }
}

#[tokio::test]
async fn test_concurrent_abort_cancels_outstanding_probes() {
    let parked = Arc::new(Mutex::new(None));
    let registry = ProbeRegistry::new()
        .with_probe(
            "waiter",
            ParkedProbe {
                token: parked.clone(),
            },
        )
        .with_probe("broken", FixedProbe(HealthStatus::Unknown));

    let engine = HealthCheckEngine::new(registry)
        .unwrap()
        .with_execution_mode(ExecutionMode::Concurrent { max_in_flight: 2 });
    let token = CancellationToken::new();

    let err = engine.run_all(&token).await.unwrap_err();
    assert_eq!(err.offending_probe(), Some("broken"));

    let outstanding = parked.lock().unwrap().clone().unwrap();
    assert!(outstanding.is_cancelled());
    // The caller's token is untouched; only the cycle's own token fired.
    assert!(!token.is_cancelled());
}

#[tokio::test]
async fn test_cycle_runs_on_spawned_task() {
    let modes = [
        ExecutionMode::Sequential,
        ExecutionMode::Concurrent { max_in_flight: 2 },
    ];

    for mode in modes {
        let registry = fixed(&[("Foo", HealthStatus::Healthy), ("Bar", HealthStatus::Degraded)])
            .with_probe("Baz", FailingProbe);
        let engine = Arc::new(
            HealthCheckEngine::new(registry)
                .unwrap()
                .with_execution_mode(mode),
        );

        let handle = tokio::spawn({
            let engine = engine.clone();
            async move {
                let token = CancellationToken::new();
                engine.run_all(&token).await
            }
        });

        let composite = handle.await.unwrap().unwrap();
        assert_eq!(composite.len(), 3, "for {:?}", mode);
        assert_eq!(composite.status(), HealthStatus::Failed, "for {:?}", mode);
    }
}

#[tokio::test]
async fn test_panicking_factory_is_recorded_as_failed() {
    let registry = fixed(&[("Foo", HealthStatus::Healthy)]).with_registration(
        ProbeRegistration::from_factory("Pool", || -> Arc<dyn Probe> {
            panic!("pool unavailable")
        }),
    );
    let engine = Arc::new(HealthCheckEngine::new(registry).unwrap());

    let handle = tokio::spawn({
        let engine = engine.clone();
        async move {
            let token = CancellationToken::new();
            engine.run_all(&token).await
        }
    });
    let composite = handle.await.unwrap().unwrap();

    assert_eq!(composite.status(), HealthStatus::Failed);
    assert_eq!(composite.get("Foo").unwrap().status(), HealthStatus::Healthy);

    let entry = composite.get("pool").unwrap();
    assert_eq!(entry.status(), HealthStatus::Failed);
    let failure = entry.error().unwrap();
    assert_eq!(
        failure.downcast_ref::<ProbePanic>().unwrap().message,
        "pool unavailable"
    );
}
