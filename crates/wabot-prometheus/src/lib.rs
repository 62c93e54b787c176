// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics adapter for the Wabot backend.
//!
//! Uses the metrics-rs facade with the Prometheus exporter.
//! Metrics are rendered as Prometheus text format via [`PrometheusAdapter::render`],
//! which the gateway exposes on `/metrics`.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use wabot_core::traits::adapter::PluginAdapter;
use wabot_core::types::{AdapterType, HealthStatus};
use wabot_core::WabotError;

pub use recording::{
    record_completion_fallback, record_completion_latency, record_dispatch_outcome,
    record_send_failure, record_webhook_event, register_metrics,
};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Installs the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call errors.
    pub fn new() -> Result<Self, WabotError> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| WabotError::Internal(format!("failed to install Prometheus recorder: {e}")))?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Wraps an existing handle without installing anything.
    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// Get a reference to the Prometheus handle.
    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, WabotError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), WabotError> {
        Ok(())
    }
}
