// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evolution API messaging gateway adapter for Wabot.
//!
//! Implements [`MessagingGateway`] on top of [`EvolutionClient`]. Phone
//! numbers are normalized to digits with a country code before they leave
//! the process, and delivery failures are reported as `false`, never as errors.

pub mod client;

use async_trait::async_trait;
use tracing::{info, warn};
use wabot_config::model::EvolutionConfig;
use wabot_core::phone::normalize_phone;
use wabot_core::traits::{MessagingGateway, PluginAdapter};
use wabot_core::types::{AdapterType, HealthStatus};
use wabot_core::WabotError;

pub use crate::client::EvolutionClient;

/// Messaging gateway backed by an Evolution API server.
pub struct EvolutionGateway {
    client: EvolutionClient,
    default_country_code: String,
}

impl EvolutionGateway {
    /// Creates the gateway from the `[evolution]` config section.
    pub fn new(config: &EvolutionConfig) -> Result<Self, WabotError> {
        let client = EvolutionClient::new(config)?;
        info!(base_url = client.base_url(), "Evolution gateway initialized");
        Ok(Self {
            client,
            default_country_code: config.default_country_code.clone(),
        })
    }
}

#[async_trait]
impl PluginAdapter for EvolutionGateway {
    fn name(&self) -> &str {
        "evolution"
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
impl MessagingGateway for EvolutionGateway {
    async fn send_text(&self, instance: &str, phone: &str, text: &str) -> bool {
        let number = normalize_phone(phone, &self.default_country_code);
        if number.is_empty() {
            warn!(instance, phone, "refusing to send to a number without digits");
            return false;
        }

        match self.client.send_text(instance, &number, text).await {
            Ok(()) => true,
            Err(e) => {
                warn!(instance, phone = %number, error = %e, "reply delivery failed");
                false
            }
        }
    }

    async fn connection_state(&self, instance: &str) -> Result<String, WabotError> {
        self.client.connection_state(instance).await
    }
}
