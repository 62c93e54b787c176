// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use wabot_core::WabotError;
use wabot_dispatch::Pipeline;

use crate::handlers;

/// Path prefix of the webhook route; the instance id follows it.
pub const WEBHOOK_PATH: &str = "/webhook/whatsapp";

/// State for the unauthenticated health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Prometheus render function; `None` when metrics are disabled.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub health: HealthState,
}

/// Gateway server bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the router:
/// - POST /webhook/whatsapp/{instance_id}
/// - GET /webhook/whatsapp/{instance_id} (verification challenge)
/// - GET /health
/// - GET /metrics
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(
            &format!("{WEBHOOK_PATH}/{{instance_id}}"),
            get(handlers::get_webhook_challenge).post(handlers::post_webhook),
        )
        .route("/health", get(handlers::get_public_health))
        .route("/metrics", get(handlers::get_public_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), WabotError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WabotError::Gateway {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("webhook gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| WabotError::Gateway {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("webhook gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}
