//! Probe results and the composite result of one evaluation cycle

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::aggregate::aggregate_status;
use crate::name::ProbeName;
use crate::status::HealthStatus;

/// Error type probes raise when they cannot complete
pub type ProbeError = Box<dyn StdError + Send + Sync + 'static>;

/// A captured probe failure
///
/// Wraps the error a probe raised so the result stays cheap to clone while
/// keeping the original cause reachable through [`ProbeFailure::source_error`].
#[derive(Clone)]
pub struct ProbeFailure {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl ProbeFailure {
    pub fn new(error: impl Into<ProbeError>) -> Self {
        let boxed: ProbeError = error.into();
        Self {
            inner: Arc::from(boxed),
        }
    }

    pub fn message(&self) -> String {
        self.inner.to_string()
    }

    /// The error originally raised by the probe
    pub fn source_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }

    /// Attempt to view the captured error as a concrete type
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }
}

impl fmt::Debug for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProbeFailure").field(&self.message()).finish()
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Serialize for ProbeFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.message())
    }
}

/// Outcome of a single probe
///
/// Immutable once built. Probes construct one with the status helpers and
/// `with_*` builders; the engine attaches timing and registration tags
/// before the result is recorded.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    status: HealthStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ProbeFailure>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    data: BTreeMap<String, serde_json::Value>,

    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    duration: Duration,

    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
}

impl ProbeResult {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            description: None,
            error: None,
            data: BTreeMap::new(),
            duration: Duration::ZERO,
            tags: BTreeSet::new(),
        }
    }

    /// Create healthy result
    pub fn healthy() -> Self {
        Self::new(HealthStatus::Healthy)
    }

    /// Create degraded result
    pub fn degraded(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded).with_description(description)
    }

    /// Create unhealthy result
    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self::new(HealthStatus::Unhealthy).with_description(description)
    }

    /// Create a failed result from a captured error; the description is the error message
    pub fn failed(error: impl Into<ProbeError>) -> Self {
        let failure = ProbeFailure::new(error);
        Self {
            description: Some(failure.message()),
            error: Some(failure),
            ..Self::new(HealthStatus::Failed)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<ProbeError>) -> Self {
        self.error = Some(ProbeFailure::new(error));
        self
    }

    /// Add a diagnostic value
    pub fn with_data(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub(crate) fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub(crate) fn with_tags(mut self, tags: &BTreeSet<String>) -> Self {
        self.tags = tags.clone();
        self
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn error(&self) -> Option<&ProbeFailure> {
        self.error.as_ref()
    }

    pub fn data(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.data
    }

    /// Time the engine spent invoking the probe
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Tags of the registration that produced this result
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// Aggregated verdict plus per-probe breakdown for one evaluation cycle
#[derive(Debug, Clone)]
pub struct CompositeResult {
    status: HealthStatus,
    entries: BTreeMap<ProbeName, ProbeResult>,
    total_duration: Duration,
}

impl CompositeResult {
    /// Fold entries into a composite result
    pub fn from_entries(
        entries: BTreeMap<ProbeName, ProbeResult>,
        total_duration: Duration,
    ) -> Self {
        Self {
            status: aggregate_status(&entries),
            entries,
            total_duration,
        }
    }

    /// Worst status among all entries, `Healthy` when there are none
    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn entries(&self) -> &BTreeMap<ProbeName, ProbeResult> {
        &self.entries
    }

    /// Case-insensitive lookup by probe name
    pub fn get(&self, name: &str) -> Option<&ProbeResult> {
        self.entries.get(&ProbeName::new(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProbeName, &ProbeResult)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }
}

impl Serialize for CompositeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CompositeResult", 3)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("total_duration_ms", &duration_millis(self.total_duration))?;
        state.serialize_field("entries", &self.entries)?;
        state.end()
    }
}

fn duration_millis(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration_millis(*duration))
}
