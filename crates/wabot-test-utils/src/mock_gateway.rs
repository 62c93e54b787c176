// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging gateway for deterministic testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use wabot_core::traits::adapter::PluginAdapter;
use wabot_core::traits::gateway::MessagingGateway;
use wabot_core::types::{AdapterType, HealthStatus};
use wabot_core::WabotError;

/// A reply captured by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    pub instance: String,
    pub phone: String,
    pub text: String,
}

/// A messaging gateway that records every send.
///
/// Sends succeed unless [`set_deliver(false)`](Self::set_deliver) is called.
/// Connection states are scripted per instance; unscripted instances error.
pub struct MockGateway {
    sent: Mutex<Vec<SentText>>,
    deliver: AtomicBool,
    send_delay: Mutex<Option<Duration>>,
    states: Mutex<HashMap<String, String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            deliver: AtomicBool::new(true),
            send_delay: Mutex::new(None),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Whether subsequent sends report success.
    pub fn set_deliver(&self, deliver: bool) {
        self.deliver.store(deliver, Ordering::SeqCst);
    }

    /// Delay every send by `delay` before answering.
    pub async fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock().await = Some(delay);
    }

    /// Script the connection state reported for `instance`.
    pub async fn set_state(&self, instance: &str, state: &str) {
        self.states
            .lock()
            .await
            .insert(instance.to_string(), state.to_string());
    }

    /// All sends attempted so far, in order.
    pub async fn sent(&self) -> Vec<SentText> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Gateway
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    async fn send_text(&self, instance: &str, phone: &str, text: &str) -> bool {
        self.sent.lock().await.push(SentText {
            instance: instance.to_string(),
            phone: phone.to_string(),
            text: text.to_string(),
        });
        let delay = *self.send_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.deliver.load(Ordering::SeqCst)
    }

    async fn connection_state(&self, instance: &str) -> Result<String, WabotError> {
        self.states
            .lock()
            .await
            .get(instance)
            .cloned()
            .ok_or_else(|| WabotError::Gateway {
                message: format!("instance {instance} unreachable"),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sends_in_order() {
        let gateway = MockGateway::new();
        assert!(gateway.send_text("i1", "551100000000", "first").await);
        assert!(gateway.send_text("i1", "551100000000", "second").await);

        let sent = gateway.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].text, "first");
        assert_eq!(sent[1].text, "second");
    }

    #[tokio::test]
    async fn failing_sends_are_still_recorded() {
        let gateway = MockGateway::new();
        gateway.set_deliver(false);
        assert!(!gateway.send_text("i1", "1", "x").await);
        assert_eq!(gateway.sent_count().await, 1);
    }

    #[tokio::test]
    async fn scripted_states() {
        let gateway = MockGateway::new();
        gateway.set_state("i1", "open").await;
        assert_eq!(gateway.connection_state("i1").await.unwrap(), "open");
        assert!(gateway.connection_state("i2").await.is_err());
    }
}
