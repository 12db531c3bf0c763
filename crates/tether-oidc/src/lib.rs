// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenID Connect authorization-code verifier.
//!
//! Endpoints come from the issuer's discovery document. A callback code is
//! redeemed at the token endpoint with the client credentials, and the
//! access token is used to read the userinfo claims. The subject is a
//! configurable numeric claim (`isu` by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use tether_config::model::OidcConfig;
use tether_core::{IdentityVerifier, TetherError, UserId, VerifiedClaims};

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// The discovery fields this crate uses. Others are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

fn identity_err(message: impl Into<String>, e: reqwest::Error) -> TetherError {
    TetherError::Identity {
        message: format!("{}: {e}", message.into()),
        source: Some(Box::new(e)),
    }
}

/// [`IdentityVerifier`] backed by an OpenID Connect provider.
pub struct OidcVerifier {
    client: reqwest::Client,
    endpoints: ProviderEndpoints,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    subject_claim: String,
}

impl OidcVerifier {
    /// Fetch the issuer's discovery document and build a verifier from it.
    pub async fn discover(config: &OidcConfig) -> Result<Self, TetherError> {
        let client = build_client()?;
        let url = format!("{}{DISCOVERY_PATH}", config.issuer_url.trim_end_matches('/'));
        debug!(%url, "fetching OpenID discovery document");

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| identity_err("discovery request failed", e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TetherError::identity(format!(
                "discovery returned {status}: {body}"
            )));
        }
        let endpoints: ProviderEndpoints = response
            .json()
            .await
            .map_err(|e| identity_err("invalid discovery document", e))?;

        info!(issuer = %config.issuer_url, "OpenID provider discovered");
        Self::from_parts(client, config, endpoints)
    }

    /// Build a verifier from known endpoints, skipping discovery.
    pub fn with_endpoints(
        config: &OidcConfig,
        endpoints: ProviderEndpoints,
    ) -> Result<Self, TetherError> {
        Self::from_parts(build_client()?, config, endpoints)
    }

    fn from_parts(
        client: reqwest::Client,
        config: &OidcConfig,
        endpoints: ProviderEndpoints,
    ) -> Result<Self, TetherError> {
        let required = |value: &Option<String>, key: &str| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| TetherError::Config(format!("{key} is required")))
        };
        Ok(Self {
            client,
            endpoints,
            client_id: required(&config.client_id, "oidc.client_id")?,
            client_secret: required(&config.client_secret, "oidc.client_secret")?,
            redirect_url: config.redirect_url.clone(),
            subject_claim: config.subject_claim.clone(),
        })
    }

    /// Where users are sent to log in.
    pub fn authorization_endpoint(&self) -> Result<Url, TetherError> {
        Url::parse(&self.endpoints.authorization_endpoint).map_err(|e| {
            TetherError::Config(format!(
                "authorization endpoint `{}` is not a URL: {e}",
                self.endpoints.authorization_endpoint
            ))
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn redeem(&self, code: &str) -> Result<TokenResponse, TetherError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "authorization_code")
            .append_pair("code", code)
            .append_pair("redirect_uri", &self.redirect_url)
            .finish();

        let response = self
            .client
            .post(&self.endpoints.token_endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| identity_err("token request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TetherError::identity(format!(
                "token endpoint returned {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| identity_err("invalid token response", e))
    }

    async fn userinfo(&self, access_token: &str) -> Result<Value, TetherError> {
        let response = self
            .client
            .get(&self.endpoints.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| identity_err("userinfo request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TetherError::identity(format!(
                "userinfo endpoint returned {status}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| identity_err("invalid userinfo response", e))
    }
}

fn build_client() -> Result<reqwest::Client, TetherError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| TetherError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Read `sub` and the numeric subject claim from a userinfo document.
///
/// The subject claim may be a JSON number or a string of digits.
pub fn extract_subject(claims: &Value, claim: &str) -> Result<VerifiedClaims, TetherError> {
    let sub = claims
        .get("sub")
        .and_then(Value::as_str)
        .ok_or_else(|| TetherError::identity("userinfo has no `sub` claim"))?;

    let subject = match claims.get(claim) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| TetherError::identity(format!("claim `{claim}` is missing or not an integer")))?;

    Ok(VerifiedClaims {
        subject: UserId(subject),
        sub: sub.to_string(),
    })
}

#[async_trait]
impl IdentityVerifier for OidcVerifier {
    async fn exchange_code(&self, code: &str) -> Result<VerifiedClaims, TetherError> {
        let token = self.redeem(code).await?;
        if let Some(kind) = &token.token_type
            && !kind.eq_ignore_ascii_case("bearer")
        {
            return Err(TetherError::identity(format!(
                "unsupported token type `{kind}`"
            )));
        }

        let claims = self.userinfo(&token.access_token).await?;
        let verified = extract_subject(&claims, &self.subject_claim)?;
        debug!(subject = %verified.subject, "authorization code redeemed");
        Ok(verified)
    }
}
