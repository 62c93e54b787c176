// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};
use wabot_core::fallback::DEFAULT_FALLBACK_REPLIES;

/// Top-level Wabot configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WabotConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP listener for webhooks and health.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Messaging gateway (Evolution API) settings.
    #[serde(default)]
    pub evolution: EvolutionConfig,

    /// Completion service settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Prometheus metrics settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in logs and health output.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "wabot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("wabot").join("wabot.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("wabot.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Messaging gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EvolutionConfig {
    /// Base URL of the gateway API.
    #[serde(default = "default_evolution_base_url")]
    pub base_url: String,

    /// Gateway API key, sent as the `apikey` header.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Timeout for a single gateway call.
    #[serde(default = "default_evolution_timeout_secs")]
    pub timeout_secs: u64,

    /// Country code prepended to national-length phone numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            base_url: default_evolution_base_url(),
            api_key: None,
            timeout_secs: default_evolution_timeout_secs(),
            default_country_code: default_country_code(),
        }
    }
}

fn default_evolution_base_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_evolution_timeout_secs() -> u64 {
    15
}

fn default_country_code() -> String {
    "55".to_string()
}

/// Completion service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// API key. `None` requires the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0-2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound for one completion, retries included.
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,

    /// Apology phrases sent when no model reply is available.
    #[serde(default = "default_fallback_replies")]
    pub fallback_replies: Vec<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_completion_base_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_completion_timeout_secs(),
            fallback_replies: default_fallback_replies(),
        }
    }
}

fn default_completion_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_completion_timeout_secs() -> u64 {
    30
}

fn default_fallback_replies() -> Vec<String> {
    DEFAULT_FALLBACK_REPLIES.iter().map(|s| s.to_string()).collect()
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    /// Install the recorder and serve `/metrics`.
    #[serde(default)]
    pub enabled: bool,
}
