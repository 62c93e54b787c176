// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion service for deterministic testing.
//!
//! Honors the [`CompletionService`] contract: when failing it answers with
//! the fallback rotation instead of erroring.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use wabot_core::traits::adapter::PluginAdapter;
use wabot_core::traits::completion::CompletionService;
use wabot_core::types::{AdapterType, HealthStatus, Persona};
use wabot_core::{FallbackReplies, WabotError};

/// A completion service returning pre-configured replies.
///
/// Replies are popped from a FIFO queue; an empty queue yields
/// `"mock reply"`.
pub struct MockCompletion {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(Persona, String)>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    fallback: FallbackReplies,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from(responses)),
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            delay: Mutex::new(None),
            fallback: FallbackReplies::default(),
        }
    }

    pub async fn add_response(&self, text: &str) {
        self.responses.lock().await.push_back(text.to_string());
    }

    /// Simulate an unavailable model: every call answers with a fallback phrase.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every call, e.g. past the orchestrator's timeout.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// Every `(persona, input)` the service was called with.
    pub async fn calls(&self) -> Vec<(Persona, String)> {
        self.calls.lock().await.clone()
    }

    /// The fallback rotation, for asserting on fallback replies.
    pub fn fallback(&self) -> &FallbackReplies {
        &self.fallback
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockCompletion {
    fn name(&self) -> &str {
        "mock-completion"
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
impl CompletionService for MockCompletion {
    async fn complete(&self, persona: &Persona, input: &str) -> String {
        self.calls
            .lock()
            .await
            .push((persona.clone(), input.to_string()));

        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return self.fallback.next();
        }
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock reply".to_string())
    }

    fn fallback_reply(&self) -> String {
        self.fallback.next()
    }
}
