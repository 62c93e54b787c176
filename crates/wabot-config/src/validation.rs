// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::WabotConfig;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &WabotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.evolution.base_url.trim().is_empty() {
        errors.push(ConfigError::validation("evolution.base_url must not be empty"));
    }

    if config.evolution.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "evolution.timeout_secs must be greater than 0",
        ));
    }

    let cc = &config.evolution.default_country_code;
    if cc.is_empty() || !cc.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ConfigError::validation(format!(
            "evolution.default_country_code must be digits only, got `{cc}`"
        )));
    }

    if config.completion.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "completion.timeout_secs must be greater than 0",
        ));
    }

    let temperature = config.completion.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        errors.push(ConfigError::validation(format!(
            "completion.temperature must be between 0.0 and 2.0, got {temperature}"
        )));
    }

    if config.completion.fallback_replies.is_empty()
        || config
            .completion
            .fallback_replies
            .iter()
            .any(|r| r.trim().is_empty())
    {
        errors.push(ConfigError::validation(
            "completion.fallback_replies must contain at least one non-empty phrase",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&WabotConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = WabotConfig::default();
        config.server.host = String::new();
        config.evolution.timeout_secs = 0;
        config.evolution.default_country_code = "+55".into();
        config.completion.temperature = 3.5;
        config.completion.fallback_replies = vec![];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn hostname_is_accepted() {
        let mut config = WabotConfig::default();
        config.server.host = "wabot.internal".into();
        assert!(validate_config(&config).is_ok());
    }
}
