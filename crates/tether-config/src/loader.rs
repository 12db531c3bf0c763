// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tether.toml` > `~/.config/tether/tether.toml` > `/etc/tether/tether.toml`
//! with environment variable overrides via `TETHER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TetherConfig;

/// Environment variables accepted without the `TETHER_` prefix, with their config keys.
///
/// Deployments that predate the prefixed names keep working; prefixed variables win.
pub const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("ITMOID_CLIENT_ID", "oidc.client_id"),
    ("ITMOID_CLIENT_SECRET", "oidc.client_secret"),
    ("TELEGRAM_BOT_API", "telegram.bot_token"),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tether/tether.toml` (system-wide)
/// 3. `~/.config/tether/tether.toml` (user XDG config)
/// 4. `./tether.toml` (local directory)
/// 5. Legacy unprefixed variables (`ITMOID_CLIENT_ID`, ...)
/// 6. `TETHER_*` environment variables
pub fn load_config() -> Result<TetherConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and `check-config` on inline content.
pub fn load_config_from_str(toml_content: &str) -> Result<TetherConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TetherConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TetherConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TetherConfig::default()))
        .merge(Toml::file(path))
        .merge(legacy_env_provider())
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TetherConfig::default()))
        .merge(Toml::file("/etc/tether/tether.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("tether/tether.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("tether.toml"))
        .merge(legacy_env_provider())
        .merge(env_provider())
}

/// Maps `TETHER_<SECTION>_<KEY>` onto `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TETHER_OIDC_CLIENT_SECRET` must become `oidc.client_secret`.
fn env_provider() -> Env {
    Env::prefixed("TETHER_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("oidc_", "oidc.", 1)
            .replacen("gateway_", "gateway.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("session_", "session.", 1);
        mapped.into()
    })
}

fn legacy_env_provider() -> Env {
    let names: Vec<&'static str> = LEGACY_ENV_KEYS.iter().map(|(env, _)| *env).collect();
    Env::raw().only(&names).map(|key| {
        let key_str = key.as_str();
        LEGACY_ENV_KEYS
            .iter()
            .find(|(env, _)| env.eq_ignore_ascii_case(key_str))
            .map(|(_, target)| (*target).into())
            .unwrap_or_else(|| key_str.to_string().into())
    })
}
