//! CLI command definitions for vitals
//!
//! `serve` hosts the configured health endpoints; `check` runs a single
//! cycle and reports it on stdout.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use super::output::{CheckOutput, OutputFormat};
use super::ExitCode;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::handler::any_tag;
use crate::server;

/// Health check runner and server
#[derive(Parser, Debug)]
#[command(name = "vitals")]
#[command(about = "Run health checks and serve health endpoints", long_about = None)]
#[command(version)]
pub struct VitalsCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: VitalsCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum VitalsCommands {
    /// Start the HTTP server
    Serve {
        /// Path to the configuration file (YAML or JSON)
        #[arg(short, long, env = "VITALS_CONFIG")]
        config: PathBuf,

        /// Host to bind to, overriding configuration
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overriding configuration
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the configured health checks once
    ///
    /// Exits 0 when healthy, 2 when degraded, 1 when unhealthy and 4 when
    /// a check failed to complete.
    Check {
        /// Path to the configuration file (YAML or JSON)
        #[arg(short, long, env = "VITALS_CONFIG")]
        config: PathBuf,

        /// Only run probes carrying one of these tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Output format for results
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

impl VitalsCli {
    /// Default log filter for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 if matches!(self.command, VitalsCommands::Serve { .. }) => "info",
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn load_config(path: &Path) -> Result<ServiceConfig> {
    ServiceConfig::from_file(path)?.apply_env()
}

/// Execute the serve command
pub async fn execute_serve(
    config: PathBuf,
    host: Option<String>,
    port: Option<u16>,
) -> Result<ExitCode> {
    let mut config = load_config(&config)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    server::serve(config).await?;
    Ok(ExitCode::Healthy)
}

/// Execute the check command
pub async fn execute_check(
    config: PathBuf,
    tags: Vec<String>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let config = load_config(&config)?;
    let engine = server::build_engine(&config)?;
    let predicate = (!tags.is_empty()).then(|| any_tag(tags));

    let token = CancellationToken::new();
    let interrupt = token.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling health checks");
            interrupt.cancel();
        }
    });

    let outcome = engine.run(predicate.as_deref(), &token).await;
    watcher.abort();

    let result = outcome?;
    CheckOutput::from_result(&result).render(format)?;
    Ok(ExitCode::from_status(result.status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        VitalsCli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = VitalsCli::try_parse_from([
            "vitals", "check", "--config", "vitals.yaml", "--tag", "ready", "-t", "live",
            "--format", "json",
        ])
        .unwrap();

        match cli.command {
            VitalsCommands::Check {
                config,
                tags,
                format,
            } => {
                assert_eq!(config, PathBuf::from("vitals.yaml"));
                assert_eq!(tags, vec!["ready", "live"]);
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity() {
        let cli = VitalsCli::try_parse_from(["vitals", "-vv", "serve", "-c", "v.yaml"]).unwrap();
        assert_eq!(cli.log_level(), "debug");

        let cli = VitalsCli::try_parse_from(["vitals", "check", "-c", "v.yaml"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
    }
}
