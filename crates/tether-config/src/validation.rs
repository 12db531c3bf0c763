// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Credentials are not required here: `check-config` must pass on a file that
//! leaves secrets to the environment. `tether serve` checks them at startup.

use crate::diagnostic::ConfigError;
use crate::model::TetherConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &TetherConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::validation(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if !config.gateway.callback_path.starts_with('/') {
        errors.push(ConfigError::validation(format!(
            "gateway.callback_path must start with `/`, got `{}`",
            config.gateway.callback_path
        )));
    }

    for (key, value) in [
        ("oidc.issuer_url", &config.oidc.issuer_url),
        ("oidc.redirect_url", &config.oidc.redirect_url),
    ] {
        if !(value.starts_with("http://") || value.starts_with("https://")) {
            errors.push(ConfigError::validation(format!(
                "{key} must be an http(s) URL, got `{value}`"
            )));
        }
    }

    if config.oidc.subject_claim.trim().is_empty() {
        errors.push(ConfigError::validation("oidc.subject_claim must not be empty"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation("storage.database_path must not be empty"));
    }

    if config.session.inbox_capacity == 0 {
        errors.push(ConfigError::validation(
            "session.inbox_capacity must be at least 1",
        ));
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "telegram.bot_token is set but empty; remove it or provide a token",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
