// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible completion adapter for Wabot.
//!
//! Implements [`CompletionService`]: builds a system prompt from the bot's
//! persona, calls the chat completions endpoint under an overall timeout, and
//! answers with the next fallback phrase whenever no usable reply comes back.

pub mod client;
pub mod types;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use wabot_config::model::CompletionConfig;
use wabot_core::traits::{CompletionService, PluginAdapter};
use wabot_core::types::{AdapterType, HealthStatus, Persona};
use wabot_core::{FallbackReplies, WabotError};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest};

/// Completion service backed by an OpenAI-compatible API.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiCompletion {
    client: OpenAiClient,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
    fallback: FallbackReplies,
}

impl OpenAiCompletion {
    /// Creates the service from the `[completion]` config section.
    pub fn new(config: &CompletionConfig) -> Result<Self, WabotError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = OpenAiClient::new(&config.base_url, &api_key, timeout)?;

        info!(model = %config.model, "completion service initialized");

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout,
            fallback: FallbackReplies::new(config.fallback_replies.clone()),
        })
    }

    fn to_request(&self, persona: &Persona, input: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt(persona)),
                ChatMessage::user(input),
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn fall_back(&self) -> String {
        wabot_prometheus::record_completion_fallback();
        self.fallback.next()
    }
}

/// Builds the system prompt that puts the model in the bot's persona.
pub fn system_prompt(persona: &Persona) -> String {
    let mut prompt = format!(
        "You are the customer service assistant for {}. Use a {} tone.",
        persona.company, persona.tone
    );
    let instructions = persona.instructions.trim();
    if !instructions.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(instructions);
    }
    prompt.push_str(
        "\n\nKeep answers short and suited to WhatsApp. Always reply in the customer's language.",
    );
    prompt
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, WabotError> {
    if let Some(key) = config_key.as_deref().filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            WabotError::Config(
                "completion API key not set: use completion.api_key or OPENAI_API_KEY".into(),
            )
        })
}

#[async_trait]
impl PluginAdapter for OpenAiCompletion {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, persona: &Persona, input: &str) -> String {
        let request = self.to_request(persona, input);
        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.client.chat(&request)).await;
        wabot_prometheus::record_completion_latency(started.elapsed().as_secs_f64());

        match result {
            Ok(Ok(response)) => match response.first_text().map(str::trim) {
                Some(text) if !text.is_empty() => {
                    debug!(chars = text.len(), "completion reply received");
                    text.to_string()
                }
                _ => {
                    warn!("completion returned no text, using fallback reply");
                    self.fall_back()
                }
            },
            Ok(Err(e)) => {
                warn!(error = %e, "completion failed, using fallback reply");
                self.fall_back()
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "completion timed out, using fallback reply");
                self.fall_back()
            }
        }
    }

    // Not counted here: the caller that abandoned `complete` records it.
    fn fallback_reply(&self) -> String {
        self.fallback.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn persona() -> Persona {
        Persona {
            company: "Acme".into(),
            tone: "friendly".into(),
            instructions: "Only talk about orders.".into(),
        }
    }

    fn service(base_url: &str, timeout_secs: u64) -> OpenAiCompletion {
        OpenAiCompletion::new(&CompletionConfig {
            base_url: base_url.to_string(),
            api_key: Some("sk-test".into()),
            timeout_secs,
            fallback_replies: vec!["fallback one".into(), "fallback two".into()],
            ..CompletionConfig::default()
        })
        .unwrap()
    }

    fn reply(text: &str) -> serde_json::Value {
        json!({"choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]})
    }

    #[test]
    fn system_prompt_carries_persona() {
        let prompt = system_prompt(&persona());
        assert!(prompt.contains("Acme"));
        assert!(prompt.contains("friendly"));
        assert!(prompt.contains("Only talk about orders."));
        assert!(prompt.contains("customer's language"));
    }

    #[test]
    fn system_prompt_skips_blank_instructions() {
        let mut p = persona();
        p.instructions = "   ".into();
        assert!(!system_prompt(&p).contains("\n\n   "));
    }

    #[test]
    fn fallback_reply_does_not_count_a_fallback() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let svc = service("http://127.0.0.1:9", 1);

        let reply = metrics::with_local_recorder(&recorder, || svc.fallback_reply());
        assert_eq!(reply, "fallback one");
        let text = handle.render();
        assert!(!text.contains("wabot_completion_fallbacks_total 1"), "{text}");
    }

    #[tokio::test]
    async fn failed_completion_counts_one_fallback() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let reply = service(&server.uri(), 5).complete(&persona(), "hi").await;
        assert_eq!(reply, "fallback one");
        let text = handle.render();
        assert!(text.contains("wabot_completion_fallbacks_total 1"), "{text}");
    }

    #[test]
    #[serial_test::serial]
    fn api_key_from_config_wins() {
        // SAFETY: test-only env mutation, serialized with the other env tests.
        unsafe { std::env::set_var("OPENAI_API_KEY", "sk-env") };
        let key = resolve_api_key(&Some("sk-config".into()));
        unsafe { std::env::remove_var("OPENAI_API_KEY") };
        assert_eq!(key.unwrap(), "sk-config");
    }

    #[test]
    #[serial_test::serial]
    fn api_key_falls_back_to_env() {
        unsafe { std::env::set_var("OPENAI_API_KEY", "sk-env") };
        let key = resolve_api_key(&Some(String::new()));
        unsafe { std::env::remove_var("OPENAI_API_KEY") };
        assert_eq!(key.unwrap(), "sk-env");
    }

    #[test]
    #[serial_test::serial]
    fn missing_api_key_is_config_error() {
        unsafe { std::env::remove_var("OPENAI_API_KEY") };
        assert!(matches!(resolve_api_key(&None), Err(WabotError::Config(_))));
    }

    #[tokio::test]
    async fn complete_returns_model_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini", "max_tokens": 500})))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("  Hello! How can I help?  ")))
            .mount(&server)
            .await;

        let svc = service(&server.uri(), 5);
        assert_eq!(svc.complete(&persona(), "Hi").await, "Hello! How can I help?");
    }

    #[tokio::test]
    async fn complete_falls_back_on_error_in_rotation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({"error": {"message": "bad key", "type": "invalid_request_error"}}),
            ))
            .mount(&server)
            .await;

        let svc = service(&server.uri(), 5);
        assert_eq!(svc.complete(&persona(), "Hi").await, "fallback one");
        assert_eq!(svc.complete(&persona(), "Hi").await, "fallback two");
        assert_eq!(svc.complete(&persona(), "Hi").await, "fallback one");
    }

    #[tokio::test]
    async fn complete_falls_back_on_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let svc = service(&server.uri(), 5);
        assert_eq!(svc.complete(&persona(), "Hi").await, "fallback one");
    }

    #[tokio::test]
    async fn complete_falls_back_on_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reply("too late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let svc = service(&server.uri(), 1);
        assert_eq!(svc.complete(&persona(), "Hi").await, "fallback one");
    }

    #[tokio::test]
    async fn complete_falls_back_when_unreachable() {
        let svc = service("http://127.0.0.1:1", 2);
        assert_eq!(svc.complete(&persona(), "Hi").await, "fallback one");
        assert_eq!(svc.fallback_reply(), "fallback two");
    }
}
