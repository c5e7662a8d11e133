//! vitals CLI
//!
//! # Usage
//!
//! ```bash
//! # Serve the configured health endpoints
//! vitals serve --config vitals.yaml --port 8080
//!
//! # Run the readiness checks once
//! vitals check --config vitals.yaml --tag ready --format json
//! ```
//!
//! # Exit Codes
//!
//! - 0: Healthy
//! - 1: Unhealthy
//! - 2: Degraded
//! - 3: Invalid input, configuration or probe set
//! - 4: A check failed to complete
//! - 10: Internal error
//! - 130: Interrupted

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitals_api::{run_cli, VitalsCli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = VitalsCli::parse();

    // Logs go to stderr so `check --format json` output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("failed to initialise logging")?;

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
