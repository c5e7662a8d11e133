//! Error types for the health check engine

use thiserror::Error;

/// Misconfigured probe set, detected before any check runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two or more probes share a name under case-insensitive comparison.
    /// Every colliding spelling is listed, in registration order.
    #[error("Duplicate health checks were registered with the name(s): {}", .names.join(", "))]
    DuplicateNames { names: Vec<String> },
}

/// Reasons an evaluation cycle produced no composite result
#[derive(Error, Debug)]
pub enum EngineError {
    /// Cancellation was requested before the cycle completed
    #[error("Health check cycle was cancelled")]
    Cancelled,

    /// A probe returned the `Unknown` sentinel status
    #[error("Health check '{probe}' returned Unknown, which is not a valid probe status")]
    ContractViolation { probe: String },

    /// The probe set resolved for this cycle is ambiguous
    #[error(transparent)]
    InvalidProbeSet(#[from] RegistryError),
}

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }

    /// Name of the probe that broke its contract, if any
    pub fn offending_probe(&self) -> Option<&str> {
        match self {
            EngineError::ContractViolation { probe } => Some(probe),
            _ => None,
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
