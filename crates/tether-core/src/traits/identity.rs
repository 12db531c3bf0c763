// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity verification trait for the OAuth/OIDC authorization-code flow.

use async_trait::async_trait;

use crate::error::TetherError;
use crate::types::VerifiedClaims;

/// Exchanges an authorization code for a verified subject.
#[async_trait]
pub trait IdentityVerifier: Send + Sync + 'static {
    /// Redeems `code` with the identity provider and returns the verified claims.
    async fn exchange_code(&self, code: &str) -> Result<VerifiedClaims, TetherError>;
}
