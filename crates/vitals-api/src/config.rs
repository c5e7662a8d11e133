//! Service configuration
//!
//! Loaded from a YAML or JSON file (chosen by extension) with environment
//! overrides for the bind address and concurrency.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! execution:
//!   max_in_flight: 4
//! endpoints:
//!   - path: /health/live
//!     tags: [live]
//!   - path: /health/ready
//!     tags: [ready]
//!     format: json
//!     status_codes:
//!       Degraded: 503
//! probes:
//!   - name: postgres
//!     kind: tcp
//!     address: localhost:5432
//!     tags: [ready]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use vitals_core::{ExecutionMode, HealthStatus};

use crate::error::{Result, ServiceError};

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Health endpoints; a single `/health` endpoint over every probe when empty
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub probes: Vec<ProbeConfig>,
}

/// Bind address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Probe scheduling within one cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Run up to this many probes at once; sequential when absent or 1
    #[serde(default)]
    pub max_in_flight: Option<usize>,
}

impl ExecutionConfig {
    pub fn mode(&self) -> ExecutionMode {
        match self.max_in_flight {
            Some(n) if n > 1 => ExecutionMode::Concurrent { max_in_flight: n },
            _ => ExecutionMode::Sequential,
        }
    }
}

/// Response body format of an endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain-text overall status
    #[default]
    Text,
    /// Structured per-probe report
    Json,
}

/// One mounted health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub path: String,

    /// Only probes carrying at least one of these tags; every probe when empty
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub format: ResponseFormat,

    /// Overrides of the status → HTTP code mapping, keyed by status name
    #[serde(default)]
    pub status_codes: BTreeMap<String, u16>,

    #[serde(default)]
    pub allow_caching: bool,
}

impl EndpointConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tags: Vec::new(),
            format: ResponseFormat::default(),
            status_codes: BTreeMap::new(),
            allow_caching: false,
        }
    }

    /// Parsed status code overrides
    pub fn status_code_overrides(&self) -> Result<Vec<(HealthStatus, u16)>> {
        self.status_codes
            .iter()
            .map(|(status, code)| {
                let status: HealthStatus = status.parse().map_err(|e| {
                    ServiceError::config_error(format!("endpoint {}: {}", self.path, e))
                })?;
                if status.is_unknown() {
                    return Err(ServiceError::config_error(format!(
                        "endpoint {}: Unknown cannot be mapped to a status code",
                        self.path
                    )));
                }
                Ok((status, *code))
            })
            .collect()
    }
}

/// A declared probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Per-probe timeout in milliseconds
    #[serde(default = "default_probe_timeout")]
    pub timeout_ms: u64,

    #[serde(flatten)]
    pub kind: ProbeKind,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_probe_timeout() -> u64 {
    500
}

/// Built-in probe kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeKind {
    /// TCP connect to `host:port`
    Tcp { address: String },
    /// HTTP GET against a URL
    Http { url: String },
}

impl ServiceConfig {
    /// Load configuration from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::FileError(format!("{}: {}", path.display(), e)))?;

        let config: ServiceConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(ServiceError::invalid_input(format!(
                    "{}: expected a .yaml, .yml or .json file",
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(host) = std::env::var("VITALS_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("VITALS_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ServiceError::config_error(format!("VITALS_PORT: invalid port '{}'", port))
            })?;
        }
        if let Ok(n) = std::env::var("VITALS_MAX_IN_FLIGHT") {
            let n: usize = n.parse().map_err(|_| {
                ServiceError::config_error(format!("VITALS_MAX_IN_FLIGHT: invalid number '{}'", n))
            })?;
            self.execution.max_in_flight = Some(n);
        }
        Ok(self)
    }

    /// Check structural constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        for endpoint in &self.endpoints {
            if !endpoint.path.starts_with('/') {
                return Err(ServiceError::config_error(format!(
                    "endpoint path '{}' must start with '/'",
                    endpoint.path
                )));
            }
            endpoint.status_code_overrides()?;
        }

        for probe in &self.probes {
            if probe.name.trim().is_empty() {
                return Err(ServiceError::config_error("probe name must not be empty"));
            }
            if probe.timeout_ms == 0 {
                return Err(ServiceError::config_error(format!(
                    "probe '{}': timeout_ms must be greater than zero",
                    probe.name
                )));
            }
        }

        Ok(())
    }

    /// Configured endpoints, or the default `/health` endpoint
    pub fn effective_endpoints(&self) -> Vec<EndpointConfig> {
        if self.endpoints.is_empty() {
            vec![EndpointConfig::new("/health")]
        } else {
            self.endpoints.clone()
        }
    }
}
