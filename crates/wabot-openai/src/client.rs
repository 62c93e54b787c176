// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat completion APIs.
//!
//! Handles bearer authentication, request construction, and a single retry
//! on transient errors (429, 500, 503).

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};
use wabot_core::WabotError;

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// HTTP client for the `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a client for `base_url` authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, WabotError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                WabotError::Config(format!("invalid API key header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| WabotError::Completion {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            max_retries: 1,
        })
    }

    /// Sends a chat request and returns the decoded response.
    ///
    /// On transient errors, retries once after a 1-second delay.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, WabotError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.url)
                .json(request)
                .send()
                .await
                .map_err(|e| WabotError::Completion {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                return response
                    .json::<ChatResponse>()
                    .await
                    .map_err(|e| WabotError::Completion {
                        message: format!("failed to parse API response: {e}"),
                        source: Some(Box::new(e)),
                    });
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(WabotError::Completion {
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "completion API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(WabotError::Completion {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| WabotError::Completion {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
