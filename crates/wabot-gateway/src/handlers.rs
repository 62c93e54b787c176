// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook gateway.

use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};
use wabot_core::WabotError;

use crate::server::GatewayState;

/// Acknowledgement body for accepted webhooks.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// POST /webhook/whatsapp/{instance_id}
///
/// Every classified event is acknowledged with 200, including ignored ones.
/// Malformed bodies get 400; a crashed handler gets 500.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    Path(instance_id): Path<String>,
    body: Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(instance = %instance_id, error = %e, "webhook body is not JSON");
            return error_response(StatusCode::BAD_REQUEST, format!("invalid JSON body: {e}"));
        }
    };

    // Run detached so a dropped connection cannot cut a turn short.
    let pipeline = state.pipeline.clone();
    let task = tokio::spawn(async move { pipeline.handle_webhook(&instance_id, &payload).await });

    match task.await {
        Ok(Ok(_outcome)) => (StatusCode::OK, Json(WebhookAck { success: true })).into_response(),
        Ok(Err(WabotError::InvalidPayload(reason))) => {
            warn!(reason = %reason, "webhook rejected");
            error_response(StatusCode::BAD_REQUEST, reason)
        }
        Ok(Err(e)) => {
            error!(error = %e, "webhook handling failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
        Err(e) => {
            error!(error = %e, "webhook task panicked");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

/// GET /webhook/whatsapp/{instance_id}?hub.challenge=X
///
/// Echoes the verification challenge.
pub async fn get_webhook_challenge(
    Path(_instance_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    match params.get("hub.challenge") {
        Some(challenge) => (StatusCode::OK, challenge.clone()).into_response(),
        None => error_response(StatusCode::BAD_REQUEST, "missing hub.challenge"),
    }
}

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text format, or 404 when metrics are disabled.
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "metrics disabled"),
    }
}
