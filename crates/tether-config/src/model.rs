// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Tether chat bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Tether configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TetherConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// OpenID Connect identity provider settings.
    #[serde(default)]
    pub oidc: OidcConfig,

    /// HTTP server hosting the OAuth redirect target.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// User storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Per-chat session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "tether".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `tether serve`.
    #[serde(default)]
    pub bot_token: Option<String>,
}

/// OpenID Connect provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OidcConfig {
    /// Issuer URL; discovery is read from `{issuer_url}/.well-known/openid-configuration`.
    #[serde(default = "default_issuer_url")]
    pub issuer_url: String,

    /// OAuth client id registered with the provider.
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth client secret registered with the provider.
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Redirect URL registered with the provider; must reach the gateway callback.
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    /// Requested scopes.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Userinfo claim holding the numeric subject id.
    #[serde(default = "default_subject_claim")]
    pub subject_claim: String,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            issuer_url: default_issuer_url(),
            client_id: None,
            client_secret: None,
            redirect_url: default_redirect_url(),
            scopes: default_scopes(),
            subject_claim: default_subject_claim(),
        }
    }
}

fn default_issuer_url() -> String {
    "https://id.itmo.ru/auth/realms/itmo".to_string()
}

fn default_redirect_url() -> String {
    "http://localhost:8080/auth/itmoid/callback".to_string()
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string()]
}

fn default_subject_claim() -> String {
    "isu".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the OAuth redirect target.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            callback_path: default_callback_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_callback_path() -> String {
    "/auth/itmoid/callback".to_string()
}

/// User storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("tether").join("tether.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "tether.db".to_string())
}

/// Per-chat session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Capacity of each session inbox. Small values make the dispatcher
    /// wait for slow handlers instead of queueing.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,

    /// Seconds to wait for session loops to finish during shutdown.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inbox_capacity: default_inbox_capacity(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

fn default_inbox_capacity() -> usize {
    1
}

fn default_drain_timeout_secs() -> u64 {
    5
}
