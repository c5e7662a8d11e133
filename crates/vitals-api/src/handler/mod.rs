//! HTTP presentation of health check results
//!
//! An endpoint runs one evaluation cycle per request, maps the overall
//! status to an HTTP status code and renders the body with a writer.

pub mod routes;

pub use routes::HealthRouter;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use vitals_core::{CompositeResult, HealthStatus, ProbeFilter, ProbeName, ProbeRegistration};

use crate::config::{EndpointConfig, ResponseFormat};
use crate::error::{Result, ServiceError};

/// Shared probe selection predicate
pub type Predicate = Arc<ProbeFilter>;

/// Renders a composite result into a response; the status code is set afterwards
pub type ResponseWriter = Arc<dyn Fn(&CompositeResult) -> Response + Send + Sync>;

/// Mapping from overall status to HTTP status code
///
/// `Unknown` has no mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCodes {
    pub healthy: StatusCode,
    pub degraded: StatusCode,
    pub unhealthy: StatusCode,
    pub failed: StatusCode,
}

impl Default for StatusCodes {
    fn default() -> Self {
        Self {
            healthy: StatusCode::OK,
            degraded: StatusCode::OK,
            unhealthy: StatusCode::SERVICE_UNAVAILABLE,
            failed: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl StatusCodes {
    /// Override the code of one status
    pub fn with(mut self, status: HealthStatus, code: StatusCode) -> Result<Self> {
        match status {
            HealthStatus::Healthy => self.healthy = code,
            HealthStatus::Degraded => self.degraded = code,
            HealthStatus::Unhealthy => self.unhealthy = code,
            HealthStatus::Failed => self.failed = code,
            HealthStatus::Unknown => {
                return Err(ServiceError::config_error(
                    "Unknown cannot be mapped to a status code",
                ))
            }
        }
        Ok(self)
    }

    pub fn code_for(&self, status: HealthStatus) -> Option<StatusCode> {
        match status {
            HealthStatus::Healthy => Some(self.healthy),
            HealthStatus::Degraded => Some(self.degraded),
            HealthStatus::Unhealthy => Some(self.unhealthy),
            HealthStatus::Failed => Some(self.failed),
            HealthStatus::Unknown => None,
        }
    }
}

/// Writes the overall status as plain text
pub fn text_writer() -> ResponseWriter {
    Arc::new(|result: &CompositeResult| {
        (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            result.status().to_string(),
        )
            .into_response()
    })
}

/// Writes the full per-probe report as JSON
pub fn json_writer() -> ResponseWriter {
    Arc::new(|result: &CompositeResult| {
        Json(HealthReport {
            result,
            checked_at: Utc::now(),
        })
        .into_response()
    })
}

#[derive(Serialize)]
struct HealthReport<'a> {
    #[serde(flatten)]
    result: &'a CompositeResult,
    checked_at: DateTime<Utc>,
}

/// Selects probes carrying `tag`
pub fn tagged(tag: impl Into<String>) -> Predicate {
    let tag = tag.into();
    Arc::new(move |registration: &ProbeRegistration| registration.has_tag(&tag))
}

/// Selects probes carrying at least one of `tags`
pub fn any_tag<I, T>(tags: I) -> Predicate
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
    Arc::new(move |registration: &ProbeRegistration| {
        registration.tags().iter().any(|t| tags.contains(t))
    })
}

/// Selects probes by name, case-insensitively
pub fn named<I, T>(names: I) -> Predicate
where
    I: IntoIterator<Item = T>,
    T: Into<ProbeName>,
{
    let names: BTreeSet<ProbeName> = names.into_iter().map(Into::into).collect();
    Arc::new(move |registration: &ProbeRegistration| names.contains(registration.name()))
}

/// Selects every probe
pub fn all() -> Predicate {
    Arc::new(|_: &ProbeRegistration| true)
}

/// Options of one mounted health endpoint
#[derive(Clone)]
pub struct HealthEndpoint {
    predicate: Option<Predicate>,
    status_codes: StatusCodes,
    writer: ResponseWriter,
    allow_caching: bool,
}

impl fmt::Debug for HealthEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthEndpoint")
            .field("filtered", &self.predicate.is_some())
            .field("status_codes", &self.status_codes)
            .field("allow_caching", &self.allow_caching)
            .finish()
    }
}

impl Default for HealthEndpoint {
    fn default() -> Self {
        Self {
            predicate: None,
            status_codes: StatusCodes::default(),
            writer: text_writer(),
            allow_caching: false,
        }
    }
}

impl HealthEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only run probes accepted by `predicate`
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_status_codes(mut self, status_codes: StatusCodes) -> Self {
        self.status_codes = status_codes;
        self
    }

    pub fn with_writer(mut self, writer: ResponseWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Let clients and proxies cache responses
    pub fn with_caching(mut self, allow: bool) -> Self {
        self.allow_caching = allow;
        self
    }

    pub fn predicate(&self) -> Option<&ProbeFilter> {
        self.predicate.as_deref()
    }

    pub fn status_codes(&self) -> &StatusCodes {
        &self.status_codes
    }

    pub fn allows_caching(&self) -> bool {
        self.allow_caching
    }

    /// Build an endpoint from its configuration entry
    pub fn from_config(config: &EndpointConfig) -> Result<Self> {
        let mut status_codes = StatusCodes::default();
        for (status, code) in config.status_code_overrides()? {
            let code = StatusCode::from_u16(code).map_err(|_| {
                ServiceError::config_error(format!(
                    "endpoint {}: invalid status code {}",
                    config.path, code
                ))
            })?;
            status_codes = status_codes.with(status, code)?;
        }

        let writer = match config.format {
            ResponseFormat::Text => text_writer(),
            ResponseFormat::Json => json_writer(),
        };

        let mut endpoint = HealthEndpoint::new()
            .with_status_codes(status_codes)
            .with_writer(writer)
            .with_caching(config.allow_caching);

        if !config.tags.is_empty() {
            endpoint = endpoint.with_predicate(any_tag(config.tags.iter().cloned()));
        }

        Ok(endpoint)
    }

    /// Render a completed cycle
    pub fn render(&self, result: &CompositeResult) -> Response {
        let mut response = match self.status_codes.code_for(result.status()) {
            Some(code) => {
                let mut response = (self.writer)(result);
                *response.status_mut() = code;
                response
            }
            None => {
                tracing::error!(
                    status = %result.status(),
                    "No status code mapped for health status"
                );
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        };
        self.apply_cache_headers(&mut response);
        response
    }

    pub(crate) fn apply_cache_headers(&self, response: &mut Response) {
        if self.allow_caching {
            return;
        }
        let headers = response.headers_mut();
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(
            header::EXPIRES,
            HeaderValue::from_static("Thu, 01 Jan 1970 00:00:00 GMT"),
        );
    }
}
