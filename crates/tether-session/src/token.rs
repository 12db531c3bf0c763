// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlation token carried through the identity provider as the OAuth `state`.
//!
//! Layout: `nonce ‖ hex(chat) ‖ ':' ‖ b64(first_name) ‖ ':' ‖ b64(last_name)`.
//! The nonce has a fixed length, so it is split off positionally. Names are
//! base64url encoded, which keeps `:` out of every field and keeps the whole
//! string safe inside a query parameter.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

use tether_core::ChatId;

/// Random bytes behind each nonce.
pub const NONCE_BYTES: usize = 25;

const DELIMITER: char = ':';

/// Errors from decoding or checking a correlation token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("token nonce does not match this process")]
    NonceMismatch,
}

fn malformed(reason: impl Into<String>) -> TokenError {
    TokenError::MalformedToken(reason.into())
}

/// Process-wide anti-CSRF value, generated once at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    /// Draw [`NONCE_BYTES`] from the OS generator and encode them base64url.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap an existing value. Tests use this to pin the nonce.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Nonce(<redacted>)")
    }
}

/// Decoded contents of the OAuth `state` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationToken {
    pub nonce: String,
    pub chat: ChatId,
    pub first_name: String,
    pub last_name: String,
}

impl CorrelationToken {
    pub fn new(nonce: &Nonce, chat: ChatId, first_name: &str, last_name: &str) -> Self {
        Self {
            nonce: nonce.as_str().to_string(),
            chat,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    pub fn encode(&self) -> String {
        let chat = if self.chat.0 < 0 {
            format!("-{:x}", self.chat.0.unsigned_abs())
        } else {
            format!("{:x}", self.chat.0)
        };
        format!(
            "{}{chat}{DELIMITER}{}{DELIMITER}{}",
            self.nonce,
            URL_SAFE_NO_PAD.encode(&self.first_name),
            URL_SAFE_NO_PAD.encode(&self.last_name),
        )
    }

    /// Split `encoded` back into its fields. The nonce is not checked here.
    pub fn decode(encoded: &str, nonce_len: usize) -> Result<Self, TokenError> {
        let nonce = encoded
            .get(..nonce_len)
            .ok_or_else(|| malformed("shorter than the nonce"))?;
        let rest = &encoded[nonce_len..];

        let (chat, names) = rest
            .split_once(DELIMITER)
            .ok_or_else(|| malformed("missing name fields"))?;
        let (first, last) = names
            .split_once(DELIMITER)
            .ok_or_else(|| malformed("missing last name field"))?;
        if last.contains(DELIMITER) {
            return Err(malformed("too many fields"));
        }

        if chat.is_empty() || chat.starts_with('+') {
            return Err(malformed(format!("chat segment `{chat}` is not base-16")));
        }
        let chat = i64::from_str_radix(chat, 16)
            .map_err(|e| malformed(format!("chat segment `{chat}` is not base-16: {e}")))?;

        Ok(Self {
            nonce: nonce.to_string(),
            chat: ChatId(chat),
            first_name: decode_name(first)?,
            last_name: decode_name(last)?,
        })
    }

    /// Whether this token was issued under `nonce`.
    pub fn matches(&self, nonce: &Nonce) -> bool {
        self.nonce == nonce.as_str()
    }

    /// Decode and require the process nonce.
    pub fn verify(encoded: &str, nonce: &Nonce) -> Result<Self, TokenError> {
        let token = Self::decode(encoded, nonce.len())?;
        if token.matches(nonce) {
            Ok(token)
        } else {
            Err(TokenError::NonceMismatch)
        }
    }
}

fn decode_name(field: &str) -> Result<String, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(field)
        .map_err(|e| malformed(format!("name field is not base64url: {e}")))?;
    String::from_utf8(bytes).map_err(|_| malformed("name field is not UTF-8"))
}
