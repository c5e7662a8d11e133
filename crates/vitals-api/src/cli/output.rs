//! Output formatting for `vitals check`
//!
//! Renders a composite result as a colored table, JSON or the bare status.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::io::{self, Write};

use vitals_core::{CompositeResult, HealthStatus};

use crate::error::Result;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table with colors
    #[default]
    Table,
    /// JSON report for machine processing
    Json,
    /// Overall status only
    Text,
}

/// Report of one check cycle
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    pub status: HealthStatus,
    pub total_duration_ms: f64,
    pub probes: Vec<ProbeOutput>,
}

/// One probe row of the report
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutput {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
}

fn millis(duration: std::time::Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

impl CheckOutput {
    pub fn from_result(result: &CompositeResult) -> Self {
        let probes = result
            .iter()
            .map(|(name, entry)| ProbeOutput {
                name: name.to_string(),
                status: entry.status(),
                description: entry.description().map(str::to_string),
                error: entry.error().map(|e| e.message()),
                duration_ms: millis(entry.duration()),
                tags: entry.tags().iter().cloned().collect(),
                data: entry
                    .data()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            })
            .collect();

        Self {
            status: result.status(),
            total_duration_ms: millis(result.total_duration()),
            probes,
        }
    }

    /// Render output in the specified format
    pub fn render(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => self.render_json(),
            OutputFormat::Text => {
                println!("{}", self.status);
                Ok(())
            }
            OutputFormat::Table => {
                let mut stdout = io::stdout();
                self.render_table(&mut stdout);
                stdout.flush().ok();
                Ok(())
            }
        }
    }

    fn render_json(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        println!("{}", json);
        Ok(())
    }

    fn render_table(&self, out: &mut impl Write) {
        writeln!(out).ok();
        writeln!(out, "{}", "Health Check Results".cyan().bold()).ok();
        writeln!(out, "{}", "=".repeat(60)).ok();
        writeln!(out).ok();

        if self.probes.is_empty() {
            writeln!(out, "{}", "No health checks selected".dimmed()).ok();
        }

        for probe in &self.probes {
            writeln!(
                out,
                "{} {:<28} {:<10} {:>9.1} ms",
                status_icon(probe.status),
                probe.name,
                status_label(probe.status),
                probe.duration_ms
            )
            .ok();
            if let Some(description) = &probe.description {
                writeln!(out, "  {} {}", "Detail:".dimmed(), description).ok();
            }
            if let Some(error) = &probe.error {
                if probe.description.as_deref() != Some(error.as_str()) {
                    writeln!(out, "  {} {}", "Error:".dimmed(), error.red()).ok();
                }
            }
            if !probe.tags.is_empty() {
                writeln!(out, "  {} {}", "Tags:".dimmed(), probe.tags.join(", ")).ok();
            }
        }

        writeln!(out, "{}", "-".repeat(60)).ok();
        writeln!(
            out,
            "{} Overall: {} ({} probe(s) in {:.1} ms)",
            status_icon(self.status),
            status_label(self.status),
            self.probes.len(),
            self.total_duration_ms
        )
        .ok();
    }
}

fn status_icon(status: HealthStatus) -> ColoredString {
    match status {
        HealthStatus::Healthy => "+".green(),
        HealthStatus::Degraded => "!".yellow(),
        HealthStatus::Unhealthy => "x".red(),
        HealthStatus::Failed => "x".red().bold(),
        HealthStatus::Unknown => "?".white(),
    }
}

fn status_label(status: HealthStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        HealthStatus::Healthy => label.green(),
        HealthStatus::Degraded => label.yellow(),
        HealthStatus::Unhealthy => label.red(),
        HealthStatus::Failed => label.red().bold(),
        HealthStatus::Unknown => label.white(),
    }
}
