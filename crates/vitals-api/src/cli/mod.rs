//! CLI module for vitals
//!
//! Exit codes encode the overall health status so `vitals check` can be
//! used directly as a container or CI probe.

pub mod commands;
pub mod output;

pub use commands::{VitalsCli, VitalsCommands};
pub use output::{CheckOutput, OutputFormat};

use vitals_core::{EngineError, HealthStatus};

use crate::error::ServiceError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// All selected checks healthy, or the server stopped cleanly
    Healthy = 0,
    /// At least one check unhealthy
    Unhealthy = 1,
    /// At least one check degraded, none worse
    Degraded = 2,
    /// Invalid input, configuration or probe set
    InvalidInput = 3,
    /// At least one check failed to complete
    Failed = 4,
    /// Internal error
    InternalError = 10,
    /// Interrupted before the cycle completed
    Cancelled = 130,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Determine exit code from the overall status of a cycle
    pub fn from_status(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Healthy => ExitCode::Healthy,
            HealthStatus::Degraded => ExitCode::Degraded,
            HealthStatus::Unhealthy => ExitCode::Unhealthy,
            HealthStatus::Failed => ExitCode::Failed,
            HealthStatus::Unknown => ExitCode::InternalError,
        }
    }

    /// Determine exit code from an error
    pub fn from_error(err: &ServiceError) -> Self {
        match err {
            ServiceError::Engine(EngineError::Cancelled) => ExitCode::Cancelled,
            ServiceError::Engine(EngineError::InvalidProbeSet(_)) => ExitCode::InvalidInput,
            err if err.is_user_error() => ExitCode::InvalidInput,
            _ => ExitCode::InternalError,
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub async fn run(cli: VitalsCli) -> Result<ExitCode, ServiceError> {
    match cli.command {
        VitalsCommands::Serve { config, host, port } => {
            commands::execute_serve(config, host, port).await
        }
        VitalsCommands::Check {
            config,
            tags,
            format,
        } => commands::execute_check(config, tags, format).await,
    }
}
