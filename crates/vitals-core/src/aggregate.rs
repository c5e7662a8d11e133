//! Aggregation of individual probe results
//!
//! The worst single result determines the whole: no weighting, no partial
//! credit, no thresholds.

use std::collections::BTreeMap;

use crate::name::ProbeName;
use crate::result::ProbeResult;
use crate::status::HealthStatus;

/// Fold a name → result mapping into one status
///
/// Returns `Healthy` for an empty mapping, otherwise the most severe status present.
pub fn aggregate_status(entries: &BTreeMap<ProbeName, ProbeResult>) -> HealthStatus {
    worst_of(entries.values().map(ProbeResult::status))
}

/// Most severe status in `statuses`, `Healthy` if there are none
pub fn worst_of<I>(statuses: I) -> HealthStatus
where
    I: IntoIterator<Item = HealthStatus>,
{
    statuses.into_iter().max().unwrap_or(HealthStatus::Healthy)
}
