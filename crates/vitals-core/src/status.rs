//! Health status levels
//!
//! Statuses are totally ordered by severity. The ordering exists only for
//! aggregation: the worst status among all probes becomes the composite verdict.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Health status of a single probe or of a whole evaluation cycle
///
/// Variants are declared in ascending severity, so the derived `Ord`
/// is the aggregation order: `Unknown < Healthy < Degraded < Unhealthy < Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Sentinel: no verdict was produced. Never a valid probe outcome.
    Unknown,
    /// Fully operational
    Healthy,
    /// Operational with issues
    Degraded,
    /// Not operational
    Unhealthy,
    /// The check itself could not complete
    Failed,
}

impl HealthStatus {
    /// All statuses in ascending severity
    pub const ALL: [HealthStatus; 5] = [
        HealthStatus::Unknown,
        HealthStatus::Healthy,
        HealthStatus::Degraded,
        HealthStatus::Unhealthy,
        HealthStatus::Failed,
    ];

    /// Textual rendering used by presentation layers
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "Unknown",
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Unhealthy => "Unhealthy",
            HealthStatus::Failed => "Failed",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, HealthStatus::Unknown)
    }

    /// Whether the status should be reported as serving traffic
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a status name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown health status '{0}', expected one of Healthy, Degraded, Unhealthy, Failed")]
pub struct ParseStatusError(String);

impl FromStr for HealthStatus {
    type Err = ParseStatusError;

    /// Case-insensitive; accepts every variant including `Unknown`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HealthStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}
