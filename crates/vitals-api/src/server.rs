//! HTTP server hosting the configured health endpoints

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use vitals_core::HealthCheckEngine;

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::handler::HealthRouter;
use crate::probes::build_registry;

/// Build the engine for the declared probes
pub fn build_engine(config: &ServiceConfig) -> Result<HealthCheckEngine> {
    let engine = HealthCheckEngine::new(build_registry(&config.probes))?;
    Ok(engine.with_execution_mode(config.execution.mode()))
}

/// Build the application router
pub fn build_app(config: &ServiceConfig) -> Result<Router> {
    let engine = Arc::new(build_engine(config)?);
    let router = HealthRouter::from_config(engine, &config.effective_endpoints())?;
    Ok(router.into_router().layer(TraceLayer::new_for_http()))
}

/// Serve until interrupted
pub async fn serve(config: ServiceConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| ServiceError::invalid_input(format!("invalid bind address: {}", e)))?;
    let app = build_app(&config)?;

    let endpoints = config.effective_endpoints();
    let paths: Vec<&str> = endpoints.iter().map(|e| e.path.as_str()).collect();
    tracing::info!(
        %addr,
        probes = config.probes.len(),
        endpoints = ?paths,
        "Starting health check server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::ServerError(format!("failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerError(e.to_string()))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
