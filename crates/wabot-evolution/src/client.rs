// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Evolution API.
//!
//! Provides [`EvolutionClient`] which handles authentication, request
//! construction, and response decoding for the two calls the backend needs:
//! sending a text message and reading an instance's connection state.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;
use wabot_config::model::EvolutionConfig;
use wabot_core::WabotError;

/// Body of `POST /message/sendText/{instance}`.
#[derive(Debug, Serialize)]
pub struct SendTextRequest<'a> {
    pub number: &'a str,
    pub text: &'a str,
}

/// HTTP client for one Evolution API server.
#[derive(Debug, Clone)]
pub struct EvolutionClient {
    client: reqwest::Client,
    base_url: String,
}

impl EvolutionClient {
    /// Builds a client from the `[evolution]` config section.
    ///
    /// Every request carries the `apikey` header when one is configured and
    /// is bounded by `timeout_secs`.
    pub fn new(config: &EvolutionConfig) -> Result<Self, WabotError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = config.api_key.as_deref() {
            headers.insert(
                "apikey",
                HeaderValue::from_str(key).map_err(|e| {
                    WabotError::Config(format!("invalid evolution api key header value: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WabotError::Gateway {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `text` to an already normalized `number`. One attempt, no retry.
    pub async fn send_text(&self, instance: &str, number: &str, text: &str) -> Result<(), WabotError> {
        let url = format!("{}/message/sendText/{instance}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SendTextRequest { number, text })
            .send()
            .await
            .map_err(|e| WabotError::Gateway {
                message: format!("send request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, instance, "sendText response received");
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(WabotError::Gateway {
            message: format!("gateway returned {status}: {body}"),
            source: None,
        })
    }

    /// Reads the raw connection state of `instance`.
    ///
    /// Accepts both `{"instance": {"state": ..}}` and `{"state": ..}` shapes.
    pub async fn connection_state(&self, instance: &str) -> Result<String, WabotError> {
        let url = format!("{}/instance/connectionState/{instance}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WabotError::Gateway {
                message: format!("connectionState request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WabotError::Gateway {
                message: format!("gateway returned {status}: {body}"),
                source: None,
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| WabotError::Gateway {
            message: format!("failed to decode connectionState response: {e}"),
            source: Some(Box::new(e)),
        })?;

        extract_state(&body).ok_or_else(|| WabotError::Gateway {
            message: format!("connectionState response has no state field: {body}"),
            source: None,
        })
    }
}

fn extract_state(body: &serde_json::Value) -> Option<String> {
    body.pointer("/instance/state")
        .and_then(|v| v.as_str())
        .or_else(|| body.get("state").and_then(|v| v.as_str()))
        .map(str::to_string)
}
