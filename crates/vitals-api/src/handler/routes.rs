//! Mounting health endpoints on an axum router

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use vitals_core::{EngineError, HealthCheckEngine};

use super::HealthEndpoint;
use crate::config::EndpointConfig;
use crate::error::Result;

/// Builder for a router serving one or more health endpoints over a shared engine
#[derive(Debug, Clone)]
pub struct HealthRouter {
    engine: Arc<HealthCheckEngine>,
    endpoints: Vec<(String, HealthEndpoint)>,
}

impl HealthRouter {
    pub fn new(engine: Arc<HealthCheckEngine>) -> Self {
        Self {
            engine,
            endpoints: Vec::new(),
        }
    }

    /// Mount an endpoint at `path`
    pub fn endpoint(mut self, path: impl Into<String>, endpoint: HealthEndpoint) -> Self {
        self.endpoints.push((path.into(), endpoint));
        self
    }

    /// Mount every configured endpoint
    pub fn from_config(
        engine: Arc<HealthCheckEngine>,
        endpoints: &[EndpointConfig],
    ) -> Result<Self> {
        endpoints.iter().try_fold(Self::new(engine), |router, config| {
            Ok(router.endpoint(config.path.clone(), HealthEndpoint::from_config(config)?))
        })
    }

    pub fn into_router(self) -> Router {
        let Self { engine, endpoints } = self;
        endpoints
            .into_iter()
            .fold(Router::new(), |router, (path, endpoint)| {
                let engine = engine.clone();
                router.route(
                    &path,
                    get(move || {
                        let engine = engine.clone();
                        let endpoint = endpoint.clone();
                        async move { evaluate(&engine, &endpoint).await }
                    }),
                )
            })
    }
}

/// Run one cycle for a request
///
/// The cycle's token is cancelled when the request future is dropped.
async fn evaluate(engine: &HealthCheckEngine, endpoint: &HealthEndpoint) -> Response {
    let token = CancellationToken::new();
    let _cancel_on_drop = token.clone().drop_guard();

    match engine.run(endpoint.predicate(), &token).await {
        Ok(result) => endpoint.render(&result),
        Err(err) => {
            let mut response = error_response(&err);
            endpoint.apply_cache_headers(&mut response);
            response
        }
    }
}

fn error_response(err: &EngineError) -> Response {
    match err {
        EngineError::Cancelled => {
            tracing::warn!("Health check cycle cancelled");
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
        }
        _ => {
            tracing::error!(error = %err, "Health check cycle failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
