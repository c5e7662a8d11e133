//! Built-in probe implementations
//!
//! Each probe honours the cycle's cancellation token and its own timeout.

use std::time::{Duration, Instant};

use vitals_core::{Probe, ProbeContext, ProbeError, ProbeResult};

/// Error raised when the cycle is cancelled while a probe waits on I/O
#[derive(Debug, thiserror::Error)]
#[error("health check cancelled")]
pub struct ProbeCancelled;

/// TCP connectivity probe
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl Probe for TcpProbe {
    async fn check(&self, ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        let start = Instant::now();
        let connect =
            tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(&self.address));

        let outcome = tokio::select! {
            _ = ctx.cancellation().cancelled() => return Err(Box::new(ProbeCancelled)),
            outcome = connect => outcome,
        };

        let latency = start.elapsed().as_millis() as u64;
        let result = match outcome {
            Ok(Ok(_)) => ProbeResult::healthy(),
            Ok(Err(e)) => ProbeResult::unhealthy(format!("TCP connection failed: {}", e)),
            Err(_) => ProbeResult::unhealthy(format!(
                "TCP connection timed out after {}ms",
                self.timeout.as_millis()
            )),
        };

        Ok(result
            .with_data("address", self.address.as_str())
            .with_data("latency_ms", latency))
    }
}

/// HTTP health endpoint probe
///
/// 2xx is healthy, 5xx unhealthy, anything else degraded. Transport errors
/// are raised and recorded by the engine as failures.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl Probe for HttpProbe {
    async fn check(&self, ctx: ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        let start = Instant::now();
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let response = tokio::select! {
            _ = ctx.cancellation().cancelled() => return Err(Box::new(ProbeCancelled)),
            response = client.get(&self.url).send() => response?,
        };

        let latency = start.elapsed().as_millis() as u64;
        let status = response.status();

        let result = if status.is_success() {
            ProbeResult::healthy()
        } else if status.is_server_error() {
            ProbeResult::unhealthy(format!("Server error: {}", status))
        } else {
            ProbeResult::degraded(format!("Non-success status: {}", status))
        };

        Ok(result
            .with_data("url", self.url.as_str())
            .with_data("status_code", status.as_u16())
            .with_data("latency_ms", latency))
    }
}
