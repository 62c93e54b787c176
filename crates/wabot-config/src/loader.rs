// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wabot.toml` > `~/.config/wabot/wabot.toml` > `/etc/wabot/wabot.toml`
//! with environment variable overrides via `WABOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WabotConfig;

/// Config sections, in the order env keys are matched against them.
const SECTIONS: [&str; 6] = [
    "service",
    "server",
    "storage",
    "evolution",
    "completion",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wabot/wabot.toml`
/// 3. `~/.config/wabot/wabot.toml`
/// 4. `./wabot.toml`
/// 5. `WABOT_*` environment variables
pub fn load_config() -> Result<WabotConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WabotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WabotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WabotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG hierarchy, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WabotConfig::default()))
        .merge(Toml::file("/etc/wabot/wabot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("wabot/wabot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("wabot.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `WABOT_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` so keys containing
/// underscores (`WABOT_EVOLUTION_API_KEY` -> `evolution.api_key`) stay intact.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("WABOT_").map(|key| section_key(key.as_str()).into())
}

/// Rewrites the first `<section>_` prefix of a lowercased env key to `<section>.`.
pub(crate) fn section_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
