// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock identity provider.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use tether_core::{IdentityVerifier, TetherError, UserId, VerifiedClaims};

/// Identity provider that accepts only codes registered up front.
#[derive(Default)]
pub struct MockVerifier {
    codes: Mutex<HashMap<String, VerifiedClaims>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `code` and report `subject` as the verified identity.
    pub fn with_code(self, code: &str, subject: i64) -> Self {
        self.register(code, subject);
        self
    }

    /// Sleep for `delay` before answering each exchange.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn register(&self, code: &str, subject: i64) {
        if let Ok(mut codes) = self.codes.lock() {
            codes.insert(
                code.to_string(),
                VerifiedClaims {
                    subject: UserId(subject),
                    sub: format!("sub-{subject}"),
                },
            );
        }
    }

    /// Number of `exchange_code` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for MockVerifier {
    async fn exchange_code(&self, code: &str) -> Result<VerifiedClaims, TetherError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.codes
            .lock()
            .ok()
            .and_then(|codes| codes.get(code).cloned())
            .ok_or_else(|| TetherError::identity(format!("invalid authorization code `{code}`")))
    }
}
