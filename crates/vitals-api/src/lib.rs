//! # vitals-api
//!
//! HTTP health endpoints, built-in probes and the `vitals` CLI on top of
//! [`vitals_core`].
//!
//! ## Serving endpoints from code
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vitals_api::handler::{json_writer, tagged, HealthEndpoint, HealthRouter};
//! use vitals_api::probes::TcpProbe;
//! use vitals_core::{HealthCheckEngine, ProbeRegistration, ProbeRegistry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let postgres = TcpProbe::new("localhost:5432", Duration::from_millis(500));
//! let registry = ProbeRegistry::new()
//!     .with_registration(ProbeRegistration::new("postgres", postgres).with_tags(["ready"]));
//! let engine = Arc::new(HealthCheckEngine::new(registry)?);
//!
//! let app = HealthRouter::new(engine)
//!     .endpoint("/health/live", HealthEndpoint::new().with_predicate(tagged("live")))
//!     .endpoint("/health/ready", HealthEndpoint::new().with_writer(json_writer()))
//!     .into_router();
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod probes;
pub mod server;

pub use cli::{ExitCode, VitalsCli};
pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use handler::{HealthEndpoint, HealthRouter, StatusCodes};

/// Run the CLI and map the outcome to an exit code
pub async fn run_cli(cli: VitalsCli) -> ExitCode {
    match cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            let code = ExitCode::from_error(&err);
            if code != ExitCode::Cancelled {
                eprintln!("Error: {}", err);
            }
            tracing::debug!(error = %err, exit_code = i32::from(code), "Command failed");
            code
        }
    }
}
