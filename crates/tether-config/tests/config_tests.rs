// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Tether configuration system.

use figment::Jail;
use tether_config::diagnostic::ConfigError;
use tether_config::model::TetherConfig;
use tether_config::{load_and_validate_str, load_config, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_tether_config() {
    let toml = r#"
[agent]
name = "isu-bot"
log_level = "debug"

[telegram]
bot_token = "123:ABC"

[oidc]
issuer_url = "https://id.example.com/realms/test"
client_id = "tether"
client_secret = "s3cret"
redirect_url = "https://bot.example.com/auth/callback"
scopes = ["openid", "profile"]
subject_claim = "employee_id"

[gateway]
host = "0.0.0.0"
port = 9000
callback_path = "/auth/callback"

[storage]
database_path = "/tmp/tether-test.db"

[session]
inbox_capacity = 4
drain_timeout_secs = 2
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "isu-bot");
    assert_eq!(config.agent.log_level, "debug");
    assert_eq!(config.telegram.bot_token.as_deref(), Some("123:ABC"));
    assert_eq!(config.oidc.client_id.as_deref(), Some("tether"));
    assert_eq!(config.oidc.client_secret.as_deref(), Some("s3cret"));
    assert_eq!(config.oidc.scopes, vec!["openid", "profile"]);
    assert_eq!(config.oidc.subject_claim, "employee_id");
    assert_eq!(config.gateway.host, "0.0.0.0");
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.gateway.callback_path, "/auth/callback");
    assert_eq!(config.storage.database_path, "/tmp/tether-test.db");
    assert_eq!(config.session.inbox_capacity, 4);
    assert_eq!(config.session.drain_timeout_secs, 2);
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.agent.name, "tether");
    assert_eq!(config.agent.log_level, "info");
    assert!(config.telegram.bot_token.is_none());
    assert_eq!(config.oidc.issuer_url, "https://id.itmo.ru/auth/realms/itmo");
    assert_eq!(config.oidc.scopes, vec!["openid"]);
    assert_eq!(config.oidc.subject_claim, "isu");
    assert_eq!(config.gateway.port, 8080);
    assert_eq!(config.gateway.callback_path, "/auth/itmoid/callback");
    assert_eq!(config.session.inbox_capacity, 1);
}

#[test]
fn serialized_defaults_match_struct_defaults() {
    let config = TetherConfig::default();
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.session.drain_timeout_secs, 5);
    assert!(config.oidc.client_id.is_none());
    assert!(config.oidc.client_secret.is_none());
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let err = load_config_from_str("[metrics]\nenabled = true\n").expect_err("unknown section");
    assert!(err.to_string().contains("metrics"), "got: {err}");
}

#[test]
fn unknown_key_suggests_closest_match() {
    let toml = r#"
[oidc]
cleint_id = "tether"
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let found = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "cleint_id"
                && suggestion.as_deref() == Some("client_id")
                && valid_keys.contains("client_secret")
        })
    });
    assert!(found, "expected UnknownKey with suggestion, got: {errors:?}");
}

#[test]
fn unknown_key_carries_source_span() {
    let toml = "[gateway]\nprot = 9000\n";
    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let span = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { span, .. } => *span,
        _ => None,
    });
    let span = span.expect("span should point at the key");
    assert_eq!(&toml[span.offset()..span.offset() + span.len()], "prot");
}

#[test]
fn invalid_type_is_reported() {
    let toml = r#"
[gateway]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))),
        "got: {errors:?}"
    );
}

#[test]
fn validation_errors_surface_through_load() {
    let toml = r#"
[session]
inbox_capacity = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("zero capacity should fail");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("inbox_capacity"))
    ));
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "bot_tken".to_string(),
        suggestion: Some("bot_token".to_string()),
        valid_keys: "bot_token".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `bot_token`"), "got: {help}");

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("bot_tken"));
}

#[test]
fn prefixed_env_overrides_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "tether.toml",
            r#"
[gateway]
port = 9000
callback_path = "/from-file"
"#,
        )?;
        jail.set_env("TETHER_GATEWAY_PORT", "9443");
        jail.set_env("TETHER_OIDC_CLIENT_SECRET", "from-env");

        let config = load_config()?;
        assert_eq!(config.gateway.port, 9443);
        assert_eq!(config.gateway.callback_path, "/from-file");
        assert_eq!(config.oidc.client_secret.as_deref(), Some("from-env"));
        Ok(())
    });
}

#[test]
fn legacy_env_names_are_honored() {
    Jail::expect_with(|jail| {
        jail.set_env("ITMOID_CLIENT_ID", "legacy-id");
        jail.set_env("ITMOID_CLIENT_SECRET", "legacy-secret");
        jail.set_env("TELEGRAM_BOT_API", "42:legacy");

        let config = load_config()?;
        assert_eq!(config.oidc.client_id.as_deref(), Some("legacy-id"));
        assert_eq!(config.oidc.client_secret.as_deref(), Some("legacy-secret"));
        assert_eq!(config.telegram.bot_token.as_deref(), Some("42:legacy"));
        Ok(())
    });
}

#[test]
fn prefixed_env_wins_over_legacy_name() {
    Jail::expect_with(|jail| {
        jail.set_env("ITMOID_CLIENT_ID", "legacy-id");
        jail.set_env("TETHER_OIDC_CLIENT_ID", "prefixed-id");

        let config = load_config()?;
        assert_eq!(config.oidc.client_id.as_deref(), Some("prefixed-id"));
        Ok(())
    });
}
