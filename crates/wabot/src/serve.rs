// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wabot serve` command implementation.
//!
//! Opens storage, builds the gateway and completion clients once, and serves
//! webhooks until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info};
use wabot_config::WabotConfig;
use wabot_core::{PluginAdapter, StorageAdapter, WabotError};
use wabot_dispatch::{DispatchTimeouts, Pipeline};
use wabot_evolution::EvolutionGateway;
use wabot_gateway::{GatewayState, HealthState, ServerConfig, start_server};
use wabot_openai::OpenAiCompletion;
use wabot_prometheus::PrometheusAdapter;
use wabot_storage::SqliteStorage;

use crate::shutdown;

/// How long shutdown waits for in-flight conversation turns.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the webhook server until a shutdown signal arrives.
pub async fn run_serve(config: WabotConfig) -> Result<(), WabotError> {
    init_tracing(&config.service.log_level);
    info!(name = %config.service.name, version = env!("CARGO_PKG_VERSION"), "starting wabot");

    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    let storage: Arc<dyn StorageAdapter> = Arc::new(storage);
    storage.health_check().await?;

    let gateway = Arc::new(EvolutionGateway::new(&config.evolution)?);
    let completion = Arc::new(OpenAiCompletion::new(&config.completion)?);
    info!(
        gateway = gateway.name(),
        completion = completion.name(),
        model = %config.completion.model,
        "clients initialized"
    );

    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        if config.prometheus.enabled {
            let adapter = Arc::new(PrometheusAdapter::new()?);
            Some(Arc::new(move || adapter.render()))
        } else {
            None
        };

    let pipeline = Arc::new(Pipeline::new(
        Arc::clone(&storage),
        gateway,
        completion,
        DispatchTimeouts::from_config(&config),
    ));

    let cancel = shutdown::install_signal_handler();
    let state = GatewayState {
        pipeline: Arc::clone(&pipeline),
        health: HealthState {
            start_time: Instant::now(),
            prometheus_render,
        },
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let served = start_server(&server_config, state, cancel).await;

    shutdown::drain_turns(pipeline.dispatcher(), DRAIN_TIMEOUT).await;
    if let Err(e) = storage.close().await {
        error!(error = %e, "failed to close storage");
    }
    info!("wabot stopped");
    served
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wabot={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
